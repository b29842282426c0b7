use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use scraper::Html;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Maximal runs of ASCII letters, digits, and apostrophes; everything
    // else separates tokens. Applied after NFKC fold + lowercasing.
    static ref TOKEN_RE: Regex = Regex::new(r"[a-z0-9']+").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Extract the readable text from an HTML fragment, dropping tags and
/// decoding entities.
pub fn strip_html(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    fragment
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turns raw field text into normalized terms: optional HTML strip, NFKC
/// fold, lowercase, token extraction, stop-word removal, stemming. The
/// stemmer language is fixed at construction; the same analyzer must be
/// used for indexing and querying or scores are meaningless.
pub struct Analyzer {
    stemmer: Stemmer,
}

impl Analyzer {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            stemmer: Stemmer::create(algorithm),
        }
    }

    /// Normalize `text` into an ordered term sequence. Duplicates are
    /// preserved; aggregation happens at indexing time. Never fails:
    /// malformed input degrades to fewer or zero tokens.
    pub fn analyze(&self, text: &str, is_html: bool) -> Vec<String> {
        let plain;
        let text = if is_html {
            plain = strip_html(text);
            plain.as_str()
        } else {
            text
        };
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let mut terms = Vec::new();
        for mat in TOKEN_RE.find_iter(&normalized) {
            let token = mat.as_str();
            if is_stopword(token) {
                continue;
            }
            terms.push(self.stemmer.stem(token).to_string());
        }
        terms
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(Algorithm::English)
    }
}
