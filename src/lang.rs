//! Language tags and transcript validation heuristics.
//!
//! The live session is told to transcribe a single source language, but in
//! practice cross-talk and background speech leak through. These
//! character-class ratio checks are a cheap, approximate filter - good
//! enough to reject obvious bleed, not a language-identification system.

/// Accented characters considered French-specific.
const FRENCH_ACCENTS: &str = "àâäéèêëïîôùûüçœæÀÂÄÉÈÊËÏÎÔÙÛÜÇŒÆ";

/// Literal tokens the session emits for non-speech audio.
const NOISE_MARKERS: &[&str] = &["<noise>", "<sound>"];

/// Punctuation that terminates a sentence in any supported script.
const SENTENCE_ENDERS: &[char] = &['.', '!', '?', '。', '！', '？'];

/// Minimum Hangul/CJK character ratio for Korean and Japanese matches.
///
/// Lower than the Latin threshold: transcripts of these languages mix in
/// Latin loanwords and digits freely.
const HANGUL_CJK_RATIO: f64 = 0.3;

/// Minimum ASCII-alphabetic ratio for English and French matches.
const LATIN_RATIO: f64 = 0.5;

/// A supported source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Japanese,
    Korean,
    French,
}

impl Language {
    /// All supported languages, in menu order.
    pub const ALL: [Language; 4] = [
        Language::English,
        Language::Japanese,
        Language::Korean,
        Language::French,
    ];

    /// Two-letter language code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Japanese => "ja",
            Language::Korean => "ko",
            Language::French => "fr",
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Japanese => "Japanese",
            Language::Korean => "Korean",
            Language::French => "French",
        }
    }

    /// System instruction for the live session, in the target script.
    ///
    /// Written natively so the model treats the instruction itself as an
    /// anchor for the expected language.
    pub fn instruction(&self) -> &'static str {
        match self {
            Language::English => {
                "Transcribe ONLY English speech. Ignore any non-English audio completely."
            }
            Language::Japanese => {
                "日本語の音声のみを書き起こしてください。日本語以外の音声は完全に無視してください。"
            }
            Language::Korean => "한국어 음성만 받아 적으세요. 한국어가 아닌 음성은 무시하세요.",
            Language::French => {
                "Transcrivez UNIQUEMENT le discours en français. \
                 Ignorez complètement tout audio non français."
            }
        }
    }

    /// Parse a language code.
    pub fn from_code(code: &str) -> Option<Language> {
        match code {
            "en" => Some(Language::English),
            "ja" => Some(Language::Japanese),
            "ko" => Some(Language::Korean),
            "fr" => Some(Language::French),
            _ => None,
        }
    }
}

/// What the session expects to hear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    /// A single fixed source language (two-way pair with Korean).
    Bilingual(Language),
    /// Any supported language; translation always targets Korean.
    Mixed,
}

impl SourceMode {
    /// Whether a transcript fragment plausibly belongs to this mode's
    /// source language.
    ///
    /// Noise markers and empty text are always rejected; in mixed mode
    /// anything else passes.
    pub fn accepts(&self, text: &str) -> bool {
        if is_noise_marker(text) {
            return false;
        }
        match self {
            SourceMode::Bilingual(lang) => matches_language(text, *lang),
            SourceMode::Mixed => true,
        }
    }
}

/// True if the fragment is a recognized non-speech marker or blank.
pub fn is_noise_marker(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || NOISE_MARKERS.contains(&trimmed)
}

/// True if the text ends with sentence-terminating punctuation.
pub fn ends_with_sentence(text: &str) -> bool {
    text.trim_end()
        .chars()
        .next_back()
        .is_some_and(|c| SENTENCE_ENDERS.contains(&c))
}

/// Character-class ratio check for a specific language.
pub fn matches_language(text: &str, lang: Language) -> bool {
    match lang {
        Language::Korean => is_korean(text),
        Language::Japanese => is_japanese(text),
        Language::English => is_english(text),
        Language::French => is_french(text),
    }
}

/// Count of characters excluding spaces.
fn non_space_len(text: &str) -> usize {
    text.chars().filter(|c| *c != ' ').count()
}

/// Mostly Hangul syllables or jamo.
fn is_korean(text: &str) -> bool {
    let korean = text
        .chars()
        .filter(|c| ('\u{ac00}'..='\u{d7af}').contains(c) || ('\u{1100}'..='\u{11ff}').contains(c))
        .count();
    let non_space = non_space_len(text);
    non_space > 0 && korean as f64 / non_space as f64 > HANGUL_CJK_RATIO
}

/// Mostly hiragana, katakana, or CJK ideographs.
fn is_japanese(text: &str) -> bool {
    let japanese = text
        .chars()
        .filter(|c| {
            ('\u{3040}'..='\u{309f}').contains(c)
                || ('\u{30a0}'..='\u{30ff}').contains(c)
                || ('\u{4e00}'..='\u{9fff}').contains(c)
        })
        .count();
    let non_space = non_space_len(text);
    non_space > 0 && japanese as f64 / non_space as f64 > HANGUL_CJK_RATIO
}

/// Mostly ASCII letters with no French accents.
fn is_english(text: &str) -> bool {
    if text.chars().any(|c| FRENCH_ACCENTS.contains(c)) {
        return false;
    }
    let ascii_alpha = text.chars().filter(|c| c.is_ascii_alphabetic()).count();
    let non_space = non_space_len(text);
    non_space > 0 && ascii_alpha as f64 / non_space as f64 > LATIN_RATIO
}

/// Mostly Latin letters, with French accents or at least one ASCII letter.
fn is_french(text: &str) -> bool {
    let french = text.chars().filter(|c| FRENCH_ACCENTS.contains(*c)).count();
    let ascii_alpha = text.chars().filter(|c| c.is_ascii_alphabetic()).count();
    let non_space = non_space_len(text);
    non_space > 0
        && ascii_alpha as f64 / non_space as f64 > LATIN_RATIO
        && (french > 0 || ascii_alpha > 0)
}
