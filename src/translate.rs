//! Surface-syntax translation: rewrites the localized keyword vocabulary
//! into host-language source text, token by token.
//!
//! Only identifier-class tokens are candidates. Host keywords, literals,
//! operators, comments and whitespace are reproduced byte-for-byte, because
//! reassembly splices replacement text over the rewritten spans and copies
//! everything in between verbatim from the original source.

use indexmap::IndexMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::lexer::{lex, Token};

/// Accent- and case-insensitive canonical form used for every vocabulary
/// lookup. Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Localized keyword → host keyword. Accented spellings are listed
/// explicitly; normalization folds them onto the same entries.
const KEYWORDS: &[(&str, &str)] = &[
    ("se", "if"),
    ("senao", "else"),
    ("senão", "else"),
    ("senaose", "elif"),
    ("senãose", "elif"),
    ("enquanto", "while"),
    ("para", "for"),
    ("em", "in"),
    ("funcao", "def"),
    ("função", "def"),
    ("classe", "class"),
    ("retorne", "return"),
    ("construtor", "__init__"),
    ("isto", "self"),
    ("pare", "break"),
    ("continue", "continue"),
    ("passe", "pass"),
    ("com", "with"),
    ("como", "as"),
    ("importe", "import"),
    ("importa", "import"),
    ("de", "from"),
    ("tente", "try"),
    ("exceto", "except"),
    ("finalmente", "finally"),
    ("lance", "raise"),
    ("afirme", "assert"),
    ("global", "global"),
    ("nao_local", "nonlocal"),
    ("verdadeiro", "True"),
    ("falso", "False"),
    ("nulo", "None"),
    ("e", "and"),
    ("ou", "or"),
    ("nao", "not"),
    ("não", "not"),
    ("lambda", "lambda"),
    ("rendim", "yield"),
];

/// Localized builtin name → host builtin. These are seeded into the
/// session namespace as callable values, not rewritten by the translator.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("mostre", "print"),
    ("escreva", "print"),
    ("exiba", "print"),
    ("pergunte", "input"),
    ("entrada", "input"),
    ("leia", "input"),
    ("tamanho", "len"),
    ("len", "len"),
    ("intervalo", "range"),
    ("range", "range"),
    ("lista", "list"),
    ("dicionario", "dict"),
    ("conjunto", "set"),
    ("tupla", "tuple"),
    ("ordem", "sorted"),
    ("soma", "sum"),
    ("minimo", "min"),
    ("maximo", "max"),
    ("absoluto", "abs"),
    ("tipo", "type"),
    ("ajuda", "help"),
    ("sair", "exit"),
];

/// Localized constant name → value. Also seeded into the namespace.
const CONSTANTS: &[(&str, f64)] = &[
    ("infinito", f64::INFINITY),
    ("menos_infinito", f64::NEG_INFINITY),
    ("nan", f64::NAN),
    ("pi", std::f64::consts::PI),
    ("euler", std::f64::consts::E),
];

/// The immutable localized vocabulary: keyword table plus the alias and
/// constant tables seeded into each session. Built once, collision-checked.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    keywords: IndexMap<String, &'static str>,
}

impl Vocabulary {
    pub fn new() -> Self {
        let mut keywords = IndexMap::with_capacity(KEYWORDS.len());
        for (localized, host) in KEYWORDS {
            let key = normalize(localized);
            if let Some(previous) = keywords.insert(key.clone(), *host) {
                assert_eq!(
                    previous, *host,
                    "keyword spellings for `{}` normalize to colliding entries",
                    localized
                );
            }
            debug_assert_eq!(key, normalize(&key));
        }
        Self { keywords }
    }

    /// Host keyword text for a localized identifier, if any.
    pub fn keyword(&self, normalized: &str) -> Option<&'static str> {
        self.keywords.get(normalized).copied()
    }

    pub fn builtin_aliases(&self) -> &'static [(&'static str, &'static str)] {
        BUILTIN_ALIASES
    }

    pub fn constants(&self) -> &'static [(&'static str, f64)] {
        CONSTANTS
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

/// Token-level translator from localized surface text to host text.
#[derive(Debug, Clone)]
pub struct Translator {
    vocab: Vocabulary,
}

impl Translator {
    pub fn new() -> Self {
        Self {
            vocab: Vocabulary::new(),
        }
    }

    pub fn with_vocabulary(vocab: Vocabulary) -> Self {
        Self { vocab }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Translate localized source text into host source text. Total: if the
    /// raw text cannot be tokenized the input is returned unchanged and the
    /// real diagnostic surfaces at compile time.
    pub fn translate(&self, source: &str) -> String {
        let tokens = match lex(source) {
            Ok(tokens) => tokens,
            Err(_) => return source.to_string(),
        };

        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        let mut i = 0;
        while i < tokens.len() {
            let (token, span) = &tokens[i];
            if let Token::Name(text) = token {
                let normalized = normalize(text);

                // Lookahead merge: "senao" directly followed by "se" becomes
                // the single `elif` keyword at the first token's position.
                if normalized == "senao" {
                    if let Some((Token::Name(next), next_span)) = tokens.get(i + 1) {
                        if normalize(next) == "se" {
                            out.push_str(&source[cursor..span.start]);
                            out.push_str("elif");
                            cursor = next_span.end;
                            i += 2;
                            continue;
                        }
                    }
                }

                if let Some(host) = self.vocab.keyword(&normalized) {
                    out.push_str(&source[cursor..span.start]);
                    out.push_str(host);
                    cursor = span.end;
                }
            }
            i += 1;
        }
        out.push_str(&source[cursor..]);
        out
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}
