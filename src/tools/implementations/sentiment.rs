//! Sentiment analysis tool
//!
//! VADER valence scoring over its full lexicon, with booster words, negation,
//! contrast, capitalisation and punctuation emphasis handled by the
//! analyzer. Pure CPU, no network.

use crate::errors::ToolError;
use crate::tools::types::{parse_input, require_text, Operation, OperationContext};
use crate::types::Request;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vader_sentiment::SentimentIntensityAnalyzer;

/// Compound score above which text is positive (and below minus which it is negative)
pub const LABEL_THRESHOLD: f64 = 0.05;

#[derive(Debug, Deserialize)]
struct RawSentimentInput {
    text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentimentInput {
    pub text: String,
}

/// Proportions of negative, neutral and positive valence, plus the
/// normalized compound score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentScores {
    pub neg: f64,
    pub neu: f64,
    pub pos: f64,
    pub compound: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentOutput {
    pub label: String,
    pub scores: SentimentScores,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SentimentOperation;

#[async_trait]
impl Operation for SentimentOperation {
    type Input = SentimentInput;
    type Output = SentimentOutput;

    fn name(&self) -> &'static str {
        "sentiment"
    }

    fn validate(&self, request: &Request) -> Result<SentimentInput, ToolError> {
        let raw: RawSentimentInput = parse_input(request)?;
        Ok(SentimentInput {
            text: require_text("text", raw.text)?,
        })
    }

    async fn execute(
        &self,
        input: SentimentInput,
        _ctx: OperationContext,
    ) -> Result<SentimentOutput, ToolError> {
        Ok(analyze(&input.text))
    }
}

/// Score a piece of text
pub fn analyze(text: &str) -> SentimentOutput {
    let scores = polarity_scores(text);
    SentimentOutput {
        label: label_for(scores.compound).to_string(),
        scores,
    }
}

pub fn label_for(compound: f64) -> &'static str {
    if compound > LABEL_THRESHOLD {
        "positive"
    } else if compound < -LABEL_THRESHOLD {
        "negative"
    } else {
        "neutral"
    }
}

/// VADER polarity scores, rounded the way the reference analyzer reports them
pub fn polarity_scores(text: &str) -> SentimentScores {
    let analyzer = SentimentIntensityAnalyzer::new();
    let scores = analyzer.polarity_scores(text);
    let score = |key: &str| scores.get(key).copied().unwrap_or(0.0);

    SentimentScores {
        neg: round_to(score("neg"), 3),
        neu: round_to(score("neu"), 3),
        pos: round_to(score("pos"), 3),
        compound: round_to(score("compound"), 4),
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use serde_json::json;

    #[test]
    fn test_positive_text() {
        let out = analyze("I love this movie, it is wonderful!");
        assert_eq!(out.label, "positive");
        assert!(out.scores.compound > 0.5);
        assert!(out.scores.pos > out.scores.neg);
    }

    #[test]
    fn test_negative_text() {
        let out = analyze("This was a terrible, horrible day.");
        assert_eq!(out.label, "negative");
        assert!(out.scores.compound < -0.5);
    }

    #[test]
    fn test_neutral_text() {
        let out = analyze("The table is brown.");
        assert_eq!(out.label, "neutral");
        assert_eq!(out.scores.compound, 0.0);
        assert_eq!(out.scores.neu, 1.0);
    }

    #[test]
    fn test_matches_reference_scores() {
        let scores = polarity_scores("VADER is smart, handsome, and funny.");
        assert!((scores.compound - 0.8316).abs() < 0.01);
        assert!((scores.pos - 0.746).abs() < 0.01);
        assert_eq!(scores.neg, 0.0);
    }

    #[test]
    fn test_everyday_vocabulary() {
        assert_eq!(analyze("The movie was dull and pathetic").label, "negative");
        assert_eq!(analyze("What a delightful surprise").label, "positive");
        assert_eq!(analyze("I am furious about this scam").label, "negative");
    }

    #[test]
    fn test_negation_flips() {
        assert_eq!(analyze("The food is good").label, "positive");
        assert_eq!(analyze("The food is not good").label, "negative");
        assert_eq!(analyze("The food isn't good").label, "negative");
    }

    #[test]
    fn test_booster_strengthens() {
        let plain = polarity_scores("The food is good").compound;
        let boosted = polarity_scores("The food is very good").compound;
        let damped = polarity_scores("The food is slightly good").compound;
        assert!(boosted > plain);
        assert!(damped < plain);
    }

    #[test]
    fn test_emphasis_strengthens() {
        let plain = polarity_scores("The food is good").compound;
        let shouted = polarity_scores("The food is GOOD").compound;
        let exclaimed = polarity_scores("The food is good!!").compound;
        assert!(shouted > plain);
        assert!(exclaimed > plain);
    }

    #[test]
    fn test_but_shifts_weight() {
        assert_eq!(analyze("The plot was good but the acting was terrible").label, "negative");
    }

    #[test]
    fn test_proportions_sum_to_one() {
        let scores = polarity_scores("Great food, bad service, average prices.");
        let sum = scores.neg + scores.neu + scores.pos;
        assert!((sum - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_compound_bounded() {
        let text = "love ".repeat(200);
        let compound = polarity_scores(&text).compound;
        assert!(compound <= 1.0 && compound > 0.99);
    }

    #[test]
    fn test_label_thresholds() {
        assert_eq!(label_for(0.05), "neutral");
        assert_eq!(label_for(0.051), "positive");
        assert_eq!(label_for(-0.051), "negative");
    }

    #[test]
    fn test_validate_requires_text() {
        let request = json!({}).as_object().cloned().unwrap();
        let err = SentimentOperation.validate(&request).unwrap_err();
        assert_eq!(err.code, ErrorCode::InputInvalid);
    }
}
