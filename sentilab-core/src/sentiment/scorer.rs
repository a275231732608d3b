//! Headline polarity scoring.
//!
//! `PolarityScorer` is the seam between the pipeline and whatever turns text
//! into a number in [-1, 1]. The default implementation is VADER's compound
//! score nudged by a small finance lexicon, since VADER's general-purpose
//! dictionary has no opinion on words like "beats" or "downgrade".

use vader_sentiment::SentimentIntensityAnalyzer;

/// Turns free text into a polarity in [-1, 1] (positive = favorable).
pub trait PolarityScorer {
    fn polarity(&self, text: &str) -> f64;
}

const FINANCE_LEXICON: &[(&str, f64)] = &[
    ("beat", 0.5),
    ("beats", 0.5),
    ("tops", 0.4),
    ("surge", 0.5),
    ("surges", 0.5),
    ("soar", 0.5),
    ("soars", 0.5),
    ("rally", 0.4),
    ("rallies", 0.4),
    ("jumps", 0.4),
    ("upgrade", 0.4),
    ("upgrades", 0.4),
    ("upgraded", 0.4),
    ("outperform", 0.4),
    ("bullish", 0.5),
    ("record", 0.3),
    ("dividend", 0.2),
    ("buyback", 0.3),
    ("miss", -0.5),
    ("misses", -0.5),
    ("plunge", -0.6),
    ("plunges", -0.6),
    ("tumble", -0.5),
    ("tumbles", -0.5),
    ("slump", -0.5),
    ("slumps", -0.5),
    ("slip", -0.3),
    ("slips", -0.3),
    ("downgrade", -0.4),
    ("downgrades", -0.4),
    ("downgraded", -0.4),
    ("underperform", -0.4),
    ("bearish", -0.5),
    ("lawsuit", -0.4),
    ("recall", -0.4),
    ("investigation", -0.3),
    ("selloff", -0.4),
    ("sell-off", -0.4),
];

/// Weight of the finance lexicon relative to VADER's compound score.
const FINANCE_WEIGHT: f64 = 0.5;

/// Sum of finance-lexicon scores over the words of `text`.
pub fn finance_boost(text: &str) -> f64 {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .filter_map(|w| {
            FINANCE_LEXICON
                .iter()
                .find(|(keyword, _)| *keyword == w)
                .map(|(_, score)| *score)
        })
        .sum()
}

pub struct VaderScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl PolarityScorer for VaderScorer {
    fn polarity(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        let compound = self
            .analyzer
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0);
        (compound + FINANCE_WEIGHT * finance_boost(text)).clamp(-1.0, 1.0)
    }
}

impl<F> PolarityScorer for F
where
    F: Fn(&str) -> f64,
{
    fn polarity(&self, text: &str) -> f64 {
        self(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finance_boost_matches_whole_words() {
        assert_eq!(finance_boost("Apple beats earnings expectations"), 0.5);
        assert_eq!(finance_boost("Analysts DOWNGRADE the stock"), -0.4);
        // "recorded" is not "record"
        assert_eq!(finance_boost("Revenue recorded flat"), 0.0);
    }

    #[test]
    fn earnings_beat_is_positive() {
        let scorer = VaderScorer::new();
        assert!(scorer.polarity("Apple beats earnings expectations") > 0.0);
    }

    #[test]
    fn plunge_after_lawsuit_is_negative() {
        let scorer = VaderScorer::new();
        assert!(scorer.polarity("Shares plunge after terrible lawsuit news") < 0.0);
    }

    #[test]
    fn polarity_is_bounded() {
        let scorer = VaderScorer::new();
        let euphoric = "Amazing record rally! Stock soars, surges, beats, tops, bullish upgrade!!!";
        let p = scorer.polarity(euphoric);
        assert!((-1.0..=1.0).contains(&p));
        assert!(p > 0.5);
    }

    #[test]
    fn empty_text_is_neutral() {
        assert_eq!(VaderScorer::new().polarity("   "), 0.0);
    }

    #[test]
    fn closures_are_scorers() {
        let constant = |_: &str| 0.25;
        assert_eq!(constant.polarity("anything"), 0.25);
    }
}
