/// Values that check a checkbox or radio. Anything else leaves it alone;
/// there is no value that unchecks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruthyToken {
    Yes,
    True,
    One,
    On,
    Checked,
}

impl TruthyToken {
    pub const ALL: [TruthyToken; 5] = [
        TruthyToken::Yes,
        TruthyToken::True,
        TruthyToken::One,
        TruthyToken::On,
        TruthyToken::Checked,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TruthyToken::Yes => "yes",
            TruthyToken::True => "true",
            TruthyToken::One => "1",
            TruthyToken::On => "on",
            TruthyToken::Checked => "checked",
        }
    }

    /// Case-insensitive, no trimming.
    pub fn parse(value: &str) -> Option<Self> {
        let lower = value.to_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == lower)
    }
}

pub fn is_truthy(value: &str) -> bool {
    TruthyToken::parse(value).is_some()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMatch {
    /// Option text equals the value, ignoring case.
    Exact(usize),
    /// One contains the other, ignoring case. First option in order wins.
    Partial(usize),
}

impl OptionMatch {
    pub fn index(self) -> usize {
        match self {
            OptionMatch::Exact(i) | OptionMatch::Partial(i) => i,
        }
    }
}

/// Pick the option a free-text value refers to.
pub fn match_option(option_texts: &[String], value: &str) -> Option<OptionMatch> {
    let value = value.to_lowercase();
    let lowered: Vec<String> = option_texts.iter().map(|t| t.to_lowercase()).collect();

    if let Some(i) = lowered.iter().position(|t| *t == value) {
        return Some(OptionMatch::Exact(i));
    }

    // Departs from plain first-wins: an empty option text is contained in
    // every value, so it is never a partial candidate.
    lowered
        .iter()
        .position(|t| !t.is_empty() && (t.contains(&value) || value.contains(t.as_str())))
        .map(OptionMatch::Partial)
}
