use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "zh-CN")]
    ZhCn,
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::En),
            "zh-CN" => Ok(Language::ZhCn),
            other => Err(format!("unsupported language '{}' (expected en or zh-CN)", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unsupported theme '{}' (expected light or dark)", other)),
        }
    }
}

/// Ordered, duplicate-free list of parameter names to strip.
///
/// Entries are always trimmed and non-empty; deserialization normalizes
/// whatever is stored.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TrackingParameterList(Vec<String>);

impl TrackingParameterList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .fold(Self::new(), |list, name| add_tracking_parameter(&list, name.as_ref()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for TrackingParameterList {
    fn from(names: Vec<String>) -> Self {
        Self::from_names(names)
    }
}

impl From<TrackingParameterList> for Vec<String> {
    fn from(list: TrackingParameterList) -> Self {
        list.0
    }
}

/// Returns `list` with `name` appended.
///
/// The name is trimmed first. Empty names and names already present leave
/// the list unchanged.
pub fn add_tracking_parameter(list: &TrackingParameterList, name: &str) -> TrackingParameterList {
    let name = name.trim();
    if name.is_empty() || list.contains(name) {
        return list.clone();
    }
    let mut names = list.0.clone();
    names.push(name.to_string());
    TrackingParameterList(names)
}

/// Persisted configuration shared by every surface.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsRecord {
    pub tracking_parameters: TrackingParameterList,
    pub language: Language,
    pub theme: Theme,
}
