use async_trait::async_trait;
use thiserror::Error;
use waypoint_core::domain::{LocationQuery, Proximity, QueryTerm};

/// How the user answered a list of options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionChoice {
    Ordinal(usize),
    Name(String),
    More,
    None,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    FindNearest(QueryTerm),
    FindNearby(QueryTerm),
    FindByCategory(String),
    FindPlace(String),
    FindParking,
    FindParkingNearest,
    FindParkingNearAddress(String),
    RouteFromXToY { from: Option<String>, to: LocationQuery },
    ShowDirections,
    StartNavigation,
    Call,
    Help,
    Cancel,
    Repeat,
    SelectOption(OptionChoice),
    Unrecognized(String),
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FindNearest(_) => "find_nearest",
            Self::FindNearby(_) => "find_nearby",
            Self::FindByCategory(_) => "find_by_category",
            Self::FindPlace(_) => "find_place",
            Self::FindParking => "find_parking",
            Self::FindParkingNearest => "find_parking_nearest",
            Self::FindParkingNearAddress(_) => "find_parking_near_address",
            Self::RouteFromXToY { .. } => "route_from_x_to_y",
            Self::ShowDirections => "show_directions",
            Self::StartNavigation => "start_navigation",
            Self::Call => "call",
            Self::Help => "help",
            Self::Cancel => "cancel",
            Self::Repeat => "repeat",
            Self::SelectOption(_) => "select_option",
            Self::Unrecognized(_) => "unrecognized",
        }
    }

    /// The destination query a search intent asks for.
    pub fn query(&self) -> Option<LocationQuery> {
        let parking = || QueryTerm::Category(PARKING.to_string());
        let query = match self {
            Self::FindNearest(term) => LocationQuery::new(term.clone(), Proximity::Nearest),
            Self::FindNearby(term) => LocationQuery::new(term.clone(), Proximity::Nearby),
            Self::FindByCategory(category) => {
                LocationQuery::new(QueryTerm::Category(category.clone()), Proximity::Anywhere)
            }
            Self::FindPlace(text) => {
                LocationQuery::new(QueryTerm::Text(text.clone()), Proximity::Anywhere)
            }
            Self::FindParking => LocationQuery::new(parking(), Proximity::Nearby),
            Self::FindParkingNearest => LocationQuery::new(parking(), Proximity::Nearest),
            Self::FindParkingNearAddress(address) => {
                LocationQuery::new(parking(), Proximity::NearAddress(address.clone()))
            }
            Self::RouteFromXToY { to, .. } => to.clone(),
            _ => return None,
        };
        Some(query)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RecognizerError {
    #[error("intent recognizer unavailable: {0}")]
    Unavailable(String),
}

/// Turns an utterance into an [`Intent`]. Language understanding lives
/// behind this seam; the dialog never parses text itself.
#[async_trait]
pub trait IntentRecognizer: Send + Sync {
    async fn recognize(&self, utterance: &str) -> Result<Intent, RecognizerError>;
}

const PARKING: &str = "parking";

const CATEGORY_ALIASES: [(&str, &str); 10] = [
    ("pharmacy", "pharmacy"),
    ("pharmacies", "pharmacy"),
    ("drugstore", "pharmacy"),
    ("cafe", "cafe"),
    ("coffee shop", "cafe"),
    ("clinic", "clinic"),
    ("doctor", "clinic"),
    ("landmark", "landmark"),
    ("parking", PARKING),
    ("car park", PARKING),
];

const ANYTHING_WORDS: [&str; 8] = [
    "points of interest",
    "point of interest",
    "pois",
    "poi",
    "places",
    "place",
    "something",
    "anything",
];

const SEARCH_VERBS: [&str; 9] = [
    "find",
    "search for",
    "search",
    "look for",
    "locate",
    "show me",
    "where is",
    "i need",
    "any",
];

const NEARBY_PHRASES: [&str; 6] =
    ["nearby", "near me", "around here", "around me", "close by", "whats around"];

const NEAREST_WORDS: [&str; 2] = ["nearest", "closest"];

const ROUTE_PREFIXES: [&str; 9] = [
    "get directions to",
    "give me directions to",
    "directions to",
    "route to",
    "take me to",
    "navigate to",
    "how do i get to",
    "get me to",
    "drive to",
];

const FILLER_WORDS: [&str; 18] = [
    "option", "number", "choice", "item", "result", "entry", "the", "pick", "select", "choose",
    "please", "go", "with", "take", "i", "ill", "want", "id",
];

const DECLINE_PHRASES: [&str; 10] = [
    "none",
    "none of these",
    "none of them",
    "none of those",
    "none of the above",
    "no",
    "nope",
    "neither",
    "nothing",
    "no thanks",
];

const MORE_PHRASES: [&str; 8] = [
    "more",
    "more options",
    "show more",
    "next",
    "next page",
    "other options",
    "see more",
    "more results",
];

/// Deterministic phrase matcher used by tests and the CLI.
#[derive(Clone, Debug, Default)]
pub struct KeywordRecognizer;

impl KeywordRecognizer {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, utterance: &str) -> Intent {
        let text = normalize_utterance(utterance);

        if let Some(intent) = interruption(&text) {
            return intent;
        }
        if let Some(choice) = option_choice(&text) {
            return Intent::SelectOption(choice);
        }
        if let Some(intent) = route_request(&text) {
            return intent;
        }
        if let Some(intent) = action(&text) {
            return intent;
        }
        if let Some(intent) = search(&text) {
            return intent;
        }

        Intent::Unrecognized(utterance.trim().to_string())
    }
}

#[async_trait]
impl IntentRecognizer for KeywordRecognizer {
    async fn recognize(&self, utterance: &str) -> Result<Intent, RecognizerError> {
        Ok(self.classify(utterance))
    }
}

fn normalize_utterance(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for ch in text.chars().filter(|ch| *ch != '\'' && *ch != '\u{2019}') {
        if ch.is_alphanumeric() {
            folded.extend(ch.to_lowercase());
        } else {
            folded.push(' ');
        }
    }
    folded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_phrase(text: &str, phrase: &str) -> bool {
    format!(" {text} ").contains(&format!(" {phrase} "))
}

fn interruption(text: &str) -> Option<Intent> {
    match text {
        "help" | "help me" | "i need help" | "what can you do" | "what can i say" => {
            Some(Intent::Help)
        }
        "cancel" | "cancel that" | "stop" | "never mind" | "nevermind" | "forget it" | "quit"
        | "exit" => Some(Intent::Cancel),
        "repeat" | "repeat that" | "say that again" | "again" | "come again" => {
            Some(Intent::Repeat)
        }
        _ => None,
    }
}

fn option_choice(text: &str) -> Option<OptionChoice> {
    if DECLINE_PHRASES.contains(&text) {
        return Some(OptionChoice::None);
    }
    if MORE_PHRASES.contains(&text) {
        return Some(OptionChoice::More);
    }

    let remaining = text
        .split_whitespace()
        .filter(|token| !FILLER_WORDS.contains(token))
        .collect::<Vec<_>>();
    let ordinal = match remaining.as_slice() {
        [single] => parse_ordinal(single)?,
        [first, "one"] => parse_ordinal(first)?,
        _ => return None,
    };
    Some(OptionChoice::Ordinal(ordinal))
}

fn parse_ordinal(token: &str) -> Option<usize> {
    let by_word = match token {
        "one" | "first" => Some(1),
        "two" | "second" => Some(2),
        "three" | "third" => Some(3),
        "four" | "fourth" => Some(4),
        "five" | "fifth" => Some(5),
        "six" | "sixth" => Some(6),
        "seven" | "seventh" => Some(7),
        "eight" | "eighth" => Some(8),
        "nine" | "ninth" => Some(9),
        "ten" | "tenth" => Some(10),
        _ => None,
    };
    if by_word.is_some() {
        return by_word;
    }

    let digits = ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| token.strip_suffix(suffix))
        .unwrap_or(token);
    digits.parse::<usize>().ok().filter(|value| *value > 0)
}

fn route_request(text: &str) -> Option<Intent> {
    if let Some(rest) = text.strip_prefix("from ").or_else(|| {
        ["get directions from ", "directions from ", "route from "]
            .iter()
            .find_map(|prefix| text.strip_prefix(prefix))
    }) {
        if let Some((from, to)) = rest.split_once(" to ") {
            if !from.is_empty() && !to.is_empty() {
                return Some(Intent::RouteFromXToY {
                    from: Some(from.to_string()),
                    to: destination_query(to),
                });
            }
        }
    }

    ROUTE_PREFIXES.iter().find_map(|prefix| {
        let destination = text.strip_prefix(prefix)?.trim();
        (!destination.is_empty())
            .then(|| Intent::RouteFromXToY { from: None, to: destination_query(destination) })
    })
}

fn destination_query(text: &str) -> LocationQuery {
    let stripped = text
        .strip_prefix("the ")
        .or_else(|| text.strip_prefix("a "))
        .or_else(|| text.strip_prefix("an "))
        .unwrap_or(text);

    let nearest = NEAREST_WORDS.iter().find_map(|word| {
        stripped.strip_prefix(&format!("{word} ")).map(|rest| rest.trim().to_string())
    });
    match nearest {
        Some(rest) => LocationQuery::new(term_for(&rest), Proximity::Nearest),
        None => LocationQuery::new(term_for(stripped), Proximity::Anywhere),
    }
}

fn term_for(text: &str) -> QueryTerm {
    if let Some(category) = category_in(text) {
        return QueryTerm::Category(category.to_string());
    }
    if ANYTHING_WORDS.iter().any(|word| contains_phrase(text, word)) {
        return QueryTerm::Anything;
    }
    QueryTerm::Text(text.to_string())
}

fn category_in(text: &str) -> Option<&'static str> {
    CATEGORY_ALIASES
        .iter()
        .find(|(alias, _)| contains_phrase(text, alias))
        .map(|(_, category)| *category)
}

fn action(text: &str) -> Option<Intent> {
    let directions = ["directions", "show directions", "show me directions", "show route"];
    if directions.contains(&text)
        || text == "how do i get there"
        || text == "show me the route"
        || text == "show me the way"
    {
        return Some(Intent::ShowDirections);
    }

    match text {
        "call" | "call them" | "call it" | "call that place" | "phone them" | "give them a call"
        | "dial" => Some(Intent::Call),
        "start navigation" | "navigate" | "navigate there" | "start" | "go" | "lets go"
        | "take me there" | "start the navigation" => Some(Intent::StartNavigation),
        _ => None,
    }
}

fn search(text: &str) -> Option<Intent> {
    let verb = SEARCH_VERBS.iter().find(|verb| text.starts_with(&format!("{verb} ")));
    let nearest = NEAREST_WORDS.iter().any(|word| contains_phrase(text, word));
    let nearby = NEARBY_PHRASES.iter().any(|phrase| contains_phrase(text, phrase));
    if verb.is_none() && !nearest && !nearby {
        return None;
    }

    let category = category_in(text);
    if category == Some(PARKING) {
        if let Some(address) = near_address(text) {
            return Some(Intent::FindParkingNearAddress(address));
        }
        return Some(if nearest { Intent::FindParkingNearest } else { Intent::FindParking });
    }

    let term = match category {
        Some(category) => QueryTerm::Category(category.to_string()),
        None if ANYTHING_WORDS.iter().any(|word| contains_phrase(text, word)) => {
            QueryTerm::Anything
        }
        None if nearest || nearby => QueryTerm::Anything,
        None => {
            let subject = verb.and_then(|verb| text.strip_prefix(*verb)).unwrap_or(text).trim();
            return Some(Intent::FindPlace(subject.to_string()));
        }
    };

    Some(if nearest {
        Intent::FindNearest(term)
    } else if nearby {
        Intent::FindNearby(term)
    } else {
        match term {
            QueryTerm::Category(category) => Intent::FindByCategory(category),
            other => Intent::FindNearby(other),
        }
    })
}

fn near_address(text: &str) -> Option<String> {
    let (_, rest) = text.split_once(" near ")?;
    let rest = rest.trim();
    if rest.is_empty() || matches!(rest, "me" | "here" | "by") {
        return None;
    }
    Some(rest.to_string())
}
