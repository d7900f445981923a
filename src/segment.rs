//! Sentence segmenter for streaming LLM output
//!
//! This module provides streaming segmentation of incrementally arriving
//! tokens into sentence units that can be sent to speech synthesis as soon
//! as they are complete, without waiting for the full response.

use tracing::debug;

/// A completed sentence extracted from the token stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sentence {
    /// The accumulated text of this sentence
    pub text: String,

    /// Sequential index of this sentence in the response
    pub index: usize,
}

impl Sentence {
    /// Create a new sentence
    pub fn new(text: String, index: usize) -> Self {
        Self { text, index }
    }
}

/// Configuration for the sentence boundary rule
#[derive(Clone, Debug)]
pub struct SegmenterConfig {
    /// Base length a sentence must exceed before the first emission
    pub base_length: usize,

    /// Tokens that terminate a sentence when the length rule is met
    pub terminators: Vec<String>,

    /// How much the length multiplier grows after each emission
    pub growth: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            base_length: 20,
            terminators: vec![".".to_string()],
            growth: 2,
        }
    }
}

impl SegmenterConfig {
    /// Set the base length threshold
    pub fn with_base_length(mut self, base_length: usize) -> Self {
        self.base_length = base_length;
        self
    }

    /// Set the terminator token set
    pub fn with_terminators(mut self, terminators: Vec<String>) -> Self {
        self.terminators = terminators;
        self
    }
}

/// Streaming segmenter turning tokens into sentences
///
/// Tokens accumulate in a buffer until a terminator token arrives and the
/// buffer is long enough. The length threshold grows after each emission, so
/// the first sentence is short (fast time-to-first-audio) and later sentences
/// batch more text into fewer synthesis calls.
#[derive(Clone, Debug)]
pub struct SentenceSegmenter {
    /// Boundary rule configuration
    config: SegmenterConfig,

    /// Buffer accumulating the current sentence
    buffer: String,

    /// Current length multiplier
    multiplier: usize,

    /// Index assigned to the next emitted sentence
    next_index: usize,
}

impl Default for SentenceSegmenter {
    fn default() -> Self {
        Self::new(SegmenterConfig::default())
    }
}

impl SentenceSegmenter {
    /// Create a new segmenter with the given boundary rule
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            buffer: String::new(),
            multiplier: 1,
            next_index: 0,
        }
    }

    /// Feed a token and extract a sentence if one just completed
    ///
    /// Trailing newlines are trimmed from the token before it is appended.
    /// A sentence is emitted when the token is a terminator, the buffer
    /// exceeds the current length threshold, and the character before the
    /// terminator is a word character (guards against abbreviations,
    /// ellipses and decimal points).
    pub fn feed(&mut self, token: &str) -> Option<Sentence> {
        let token = token.trim_end_matches('\n');
        self.buffer.push_str(token);

        if !self.is_terminator(token) {
            return None;
        }

        let threshold = self.config.base_length * self.multiplier;
        if self.buffer.chars().count() <= threshold {
            return None;
        }

        if !self.word_char_precedes_terminator(token) {
            return None;
        }

        self.multiplier += self.config.growth;
        Some(self.take_sentence())
    }

    /// Flush any residual text as a final sentence
    ///
    /// Call this at the end of the token stream. The length and punctuation
    /// rules do not apply to the residue.
    pub fn finish(&mut self) -> Option<Sentence> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(self.take_sentence())
    }

    /// Index that will be assigned to the next sentence
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Current length threshold in characters
    pub fn threshold(&self) -> usize {
        self.config.base_length * self.multiplier
    }

    /// Reset the segmenter for a new response
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.multiplier = 1;
        self.next_index = 0;
    }

    fn is_terminator(&self, token: &str) -> bool {
        self.config.terminators.iter().any(|t| t == token)
    }

    /// Check that the character right before the terminator is a word char
    ///
    /// Buffers of one terminator-length or shorter have no preceding
    /// character at all; they never emit.
    fn word_char_precedes_terminator(&self, terminator: &str) -> bool {
        let body = &self.buffer[..self.buffer.len() - terminator.len()];
        match body.chars().last() {
            Some(c) => c.is_alphanumeric() || c == '_',
            None => false,
        }
    }

    fn take_sentence(&mut self) -> Sentence {
        let sentence = Sentence::new(std::mem::take(&mut self.buffer), self.next_index);
        self.next_index += 1;
        debug!(
            index = sentence.index,
            chars = sentence.text.chars().count(),
            "Sentence segmented"
        );
        sentence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(segmenter: &mut SentenceSegmenter, tokens: &[&str]) -> Vec<Sentence> {
        let mut sentences = Vec::new();
        for token in tokens {
            sentences.extend(segmenter.feed(token));
        }
        sentences
    }

    #[test]
    fn test_short_buffer_waits_for_finish() {
        // "Abc." is only 4 chars, below the threshold of 20
        let mut segmenter = SentenceSegmenter::default();
        let sentences = feed_all(&mut segmenter, &["A", "b", "c", "."]);
        assert!(sentences.is_empty());

        let last = segmenter.finish().unwrap();
        assert_eq!(last.text, "Abc.");
        assert_eq!(last.index, 0);
    }

    #[test]
    fn test_emits_once_threshold_exceeded() {
        let mut segmenter = SentenceSegmenter::default();
        let sentences = feed_all(
            &mut segmenter,
            &["The quick brown fox ", "jumps", "."],
        );

        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].text, "The quick brown fox jumps.");
        assert_eq!(sentences[0].index, 0);
        // Multiplier grew from 1 to 3
        assert_eq!(segmenter.threshold(), 60);
    }

    #[test]
    fn test_threshold_grows_per_emission() {
        let mut segmenter = SentenceSegmenter::default();
        assert_eq!(segmenter.threshold(), 20);

        feed_all(&mut segmenter, &["This sentence has enough text", "."]);
        assert_eq!(segmenter.threshold(), 60);

        // 30 chars is past the old threshold but not the new one
        let sentences = feed_all(&mut segmenter, &["Thirty characters of text here", "."]);
        assert!(sentences.is_empty());
    }

    #[test]
    fn test_no_terminator_yields_single_sentence_at_finish() {
        let mut segmenter = SentenceSegmenter::default();
        let tokens = ["a long stream ", "of text without ", "any punctuation at all"];
        assert!(feed_all(&mut segmenter, &tokens).is_empty());

        let last = segmenter.finish().unwrap();
        assert_eq!(last.text, tokens.concat());
        assert!(segmenter.finish().is_none());
    }

    #[test]
    fn test_terminator_as_first_token_does_not_emit() {
        let mut segmenter = SentenceSegmenter::new(SegmenterConfig {
            base_length: 0,
            ..Default::default()
        });

        // Buffer is just "." when the terminator arrives
        assert!(segmenter.feed(".").is_none());
        // Once a word char precedes the terminator, emission resumes
        assert!(segmenter.feed("a").is_none());
        assert!(segmenter.feed(".").is_some());
    }

    #[test]
    fn test_non_word_char_before_terminator_blocks_emission() {
        let mut segmenter = SentenceSegmenter::new(
            SegmenterConfig::default().with_base_length(1),
        );

        // Ellipsis: the char before the final "." is another "."
        assert!(segmenter.feed("Well yes...but no..").is_none());
        assert!(segmenter.feed(".").is_none());
    }

    #[test]
    fn test_trailing_newlines_trimmed() {
        let mut segmenter = SentenceSegmenter::default();
        segmenter.feed("hello\n\n");
        segmenter.feed(" world");
        let last = segmenter.finish().unwrap();
        assert_eq!(last.text, "hello world");
    }

    #[test]
    fn test_round_trip_reconstruction() {
        let tokens = [
            "The first sentence is short", ".", " The second one carries on for quite",
            " a while longer, well past sixty characters, before it finally ends", ".",
            " And a trailing fragment",
        ];

        let mut segmenter = SentenceSegmenter::default();
        let mut sentences = feed_all(&mut segmenter, &tokens);
        sentences.extend(segmenter.finish());

        let rebuilt: String = sentences.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(rebuilt, tokens.concat());
    }

    #[test]
    fn test_indices_are_dense() {
        let mut segmenter = SentenceSegmenter::new(
            SegmenterConfig::default().with_base_length(1),
        );
        let mut sentences = feed_all(
            &mut segmenter,
            &["one two three", ".", "four five six seven eight nine ten", ".", "tail"],
        );
        sentences.extend(segmenter.finish());

        let indices: Vec<usize> = sentences.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_custom_terminators() {
        let config = SegmenterConfig::default()
            .with_base_length(1)
            .with_terminators(vec![".".to_string(), "!".to_string()]);
        let mut segmenter = SentenceSegmenter::new(config);

        let sentences = feed_all(&mut segmenter, &["watch out", "!"]);
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].text, "watch out!");
    }

    #[test]
    fn test_reset() {
        let mut segmenter = SentenceSegmenter::default();
        feed_all(&mut segmenter, &["This sentence has enough text", "."]);
        assert_eq!(segmenter.next_index(), 1);

        segmenter.reset();
        assert_eq!(segmenter.next_index(), 0);
        assert_eq!(segmenter.threshold(), 20);
        assert!(segmenter.finish().is_none());
    }
}
