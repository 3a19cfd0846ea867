//! Localized response templates.
//!
//! A template id and locale map to a set of interchangeable literal strings.
//! Replies pick one at random, so callers asserting on replies should check
//! membership in [`ResponseCatalog::variants`].

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_LOCALE: &str = "en";

const EMBEDDED_RESPONSES: &str = include_str!("../resources/responses.toml");

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    Welcome,
    PromptForCurrentLocation,
    MultipleLocationsFound,
    CurrentLocationMultipleSelection,
    Cancelling,
    Help,
    MultipleRoutesFound,
    NoLocationsFound,
    NoRouteFound,
    NoPhoneNumber,
    ServiceUnavailable,
    NoMoreOptions,
    OptionOutOfRange,
    NoNameMatch,
    NoDestination,
    Unrecognized,
}

impl TemplateId {
    pub const ALL: [TemplateId; 16] = [
        Self::Welcome,
        Self::PromptForCurrentLocation,
        Self::MultipleLocationsFound,
        Self::CurrentLocationMultipleSelection,
        Self::Cancelling,
        Self::Help,
        Self::MultipleRoutesFound,
        Self::NoLocationsFound,
        Self::NoRouteFound,
        Self::NoPhoneNumber,
        Self::ServiceUnavailable,
        Self::NoMoreOptions,
        Self::OptionOutOfRange,
        Self::NoNameMatch,
        Self::NoDestination,
        Self::Unrecognized,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::PromptForCurrentLocation => "prompt_for_current_location",
            Self::MultipleLocationsFound => "multiple_locations_found",
            Self::CurrentLocationMultipleSelection => "current_location_multiple_selection",
            Self::Cancelling => "cancelling",
            Self::Help => "help",
            Self::MultipleRoutesFound => "multiple_routes_found",
            Self::NoLocationsFound => "no_locations_found",
            Self::NoRouteFound => "no_route_found",
            Self::NoPhoneNumber => "no_phone_number",
            Self::ServiceUnavailable => "service_unavailable",
            Self::NoMoreOptions => "no_more_options",
            Self::OptionOutOfRange => "option_out_of_range",
            Self::NoNameMatch => "no_name_match",
            Self::NoDestination => "no_destination",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl std::str::FromStr for TemplateId {
    type Err = ResponseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.key() == value)
            .ok_or_else(|| ResponseError::UnknownTemplate(value.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("could not parse response catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown response template `{0}`")]
    UnknownTemplate(String),
    #[error("default locale `en` is missing template `{0}`")]
    MissingDefault(&'static str),
    #[error("template `{template}` has no variants in locale `{locale}`")]
    EmptyTemplate { template: String, locale: String },
    #[error("could not render template `{template}`: {source}")]
    Render { template: &'static str, source: tera::Error },
}

/// Values substituted into template variables.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateArgs(BTreeMap<String, String>);

impl TemplateArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.0.insert(key.into(), value.to_string());
        self
    }

    fn context(&self) -> tera::Context {
        let mut context = tera::Context::new();
        for (key, value) in &self.0 {
            context.insert(key.as_str(), value);
        }
        context
    }
}

#[derive(Clone, Debug)]
pub struct ResponseCatalog {
    locales: BTreeMap<String, BTreeMap<TemplateId, Vec<String>>>,
}

impl ResponseCatalog {
    pub fn embedded() -> Result<Self, ResponseError> {
        Self::from_toml_str(EMBEDDED_RESPONSES)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ResponseError> {
        let parsed = toml::from_str::<BTreeMap<String, BTreeMap<String, Vec<String>>>>(raw)?;

        let mut locales = BTreeMap::new();
        for (locale, templates) in parsed {
            let mut mapped = BTreeMap::new();
            for (key, variants) in templates {
                let id = key.parse::<TemplateId>()?;
                if variants.iter().all(|variant| variant.trim().is_empty()) {
                    return Err(ResponseError::EmptyTemplate { template: key, locale });
                }
                mapped.insert(id, variants);
            }
            locales.insert(locale.to_ascii_lowercase(), mapped);
        }

        let catalog = Self { locales };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn locales(&self) -> Vec<&str> {
        self.locales.keys().map(String::as_str).collect()
    }

    pub fn supports(&self, locale: &str) -> bool {
        self.locales.contains_key(&normalize_locale(locale))
    }

    /// Every acceptable rendering of `id` for `locale`, falling back to the
    /// default locale when the locale lacks the template.
    pub fn variants(
        &self,
        id: TemplateId,
        locale: &str,
        args: &TemplateArgs,
    ) -> Result<Vec<String>, ResponseError> {
        let context = args.context();
        self.raw_variants(id, locale)
            .iter()
            .map(|variant| {
                tera::Tera::one_off(variant, &context, false)
                    .map_err(|source| ResponseError::Render { template: id.key(), source })
            })
            .collect()
    }

    pub fn render(
        &self,
        id: TemplateId,
        locale: &str,
        args: &TemplateArgs,
    ) -> Result<String, ResponseError> {
        let variants = self.raw_variants(id, locale);
        let chosen = variants
            .choose(&mut rand::thread_rng())
            .ok_or(ResponseError::MissingDefault(id.key()))?;
        tera::Tera::one_off(chosen, &args.context(), false)
            .map_err(|source| ResponseError::Render { template: id.key(), source })
    }

    fn raw_variants(&self, id: TemplateId, locale: &str) -> &[String] {
        let localized = self
            .locales
            .get(&normalize_locale(locale))
            .and_then(|templates| templates.get(&id));
        let fallback = || {
            self.locales.get(DEFAULT_LOCALE).and_then(|templates| templates.get(&id))
        };
        localized.or_else(fallback).map(Vec::as_slice).unwrap_or_default()
    }

    fn validate(&self) -> Result<(), ResponseError> {
        let Some(defaults) = self.locales.get(DEFAULT_LOCALE) else {
            return Err(ResponseError::MissingDefault("*"));
        };
        if let Some(missing) = TemplateId::ALL.into_iter().find(|id| !defaults.contains_key(id)) {
            return Err(ResponseError::MissingDefault(missing.key()));
        }

        // Render every variant once so a broken template fails at load time.
        let sample = TemplateArgs::new()
            .with("name", "sample")
            .with("count", 2)
            .with("ordinal", 1)
            .with("text", "sample");
        for locale in self.locales.keys() {
            for id in TemplateId::ALL {
                self.variants(id, locale, &sample)?;
            }
        }
        Ok(())
    }
}

fn normalize_locale(locale: &str) -> String {
    let lowered = locale.trim().to_ascii_lowercase();
    match lowered.split_once(|ch: char| ch == '-' || ch == '_') {
        Some((language, _)) => language.to_string(),
        None => lowered,
    }
}
