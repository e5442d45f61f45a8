use serde::{Deserialize, Serialize};

/// Language used for rider-facing text. Unknown tags fall back to English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    pub fn parse(tag: &str) -> Self {
        let language = tag.split(['-', '_']).next().unwrap_or_default();
        if language.eq_ignore_ascii_case("es") {
            Self::Es
        } else {
            Self::En
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }
}

impl From<String> for Locale {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.tag().to_string()
    }
}

/// `1 minute`, `2 minutes`; nothing at all for zero or negative counts.
pub fn minutes_phrase(minutes: i64, locale: Locale) -> Option<String> {
    let (singular, plural) = match locale {
        Locale::En => ("minute", "minutes"),
        Locale::Es => ("minuto", "minutos"),
    };
    match minutes {
        m if m <= 0 => None,
        1 => Some(format!("1 {singular}")),
        m => Some(format!("{m} {plural}")),
    }
}

/// `SLIGHTLY_LEFT` -> `Slightly left`
fn humanize(raw: &str) -> String {
    let lower = raw.replace('_', " ").to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn relative_direction(direction: &str, locale: Locale) -> String {
    if locale == Locale::En {
        return match direction {
            "UTURN_LEFT" | "UTURN_RIGHT" => "Make a U-turn".to_string(),
            "CIRCLE_CLOCKWISE" | "CIRCLE_COUNTERCLOCKWISE" => "Take the roundabout".to_string(),
            other => humanize(other),
        };
    }

    let text = match direction {
        "HARD_LEFT" => "Gire fuertemente a la izquierda",
        "LEFT" => "Gire a la izquierda",
        "SLIGHTLY_LEFT" => "Gire ligeramente a la izquierda",
        "CONTINUE" => "Continúe",
        "SLIGHTLY_RIGHT" => "Gire ligeramente a la derecha",
        "RIGHT" => "Gire a la derecha",
        "HARD_RIGHT" => "Gire fuertemente a la derecha",
        "UTURN_LEFT" | "UTURN_RIGHT" => "Dé la vuelta",
        "CIRCLE_CLOCKWISE" | "CIRCLE_COUNTERCLOCKWISE" => "Tome la rotonda",
        "ELEVATOR" => "Tome el ascensor",
        "ENTER_STATION" => "Entre a la estación",
        "EXIT_STATION" => "Salga de la estación",
        "FOLLOW_SIGNS" => "Siga las señales",
        other => return humanize(other),
    };
    text.to_string()
}

pub fn absolute_direction(direction: &str, locale: Locale) -> String {
    if locale == Locale::En {
        return humanize(direction);
    }

    let text = match direction {
        "NORTH" => "norte",
        "NORTHEAST" => "noreste",
        "EAST" => "este",
        "SOUTHEAST" => "sureste",
        "SOUTH" => "sur",
        "SOUTHWEST" => "suroeste",
        "WEST" => "oeste",
        "NORTHWEST" => "noroeste",
        other => return other.to_lowercase(),
    };
    text.to_string()
}
