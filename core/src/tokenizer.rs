use crate::numerals::{spell, try_parse_number};
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// ASCII punctuation; every character is a stop token on its own.
const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

const FUNCTION_WORDS: &[&str] = &[
    "a","à","ao","aos","aquela","aquelas","aquele","aqueles","aquilo","as","às","até",
    "com","como","da","das","de","dela","delas","dele","deles","depois","do","dos",
    "e","é","ela","elas","ele","eles","em","entre","era","eram","éramos","essa","essas","esse","esses","esta","está",
    "estamos","estão","estar","estas","estava","estavam","estávamos","este","esteja","estejam","estejamos","estes",
    "esteve","estive","estivemos","estiver","estivera","estiveram","estivéramos","estiverem","estivermos","estivesse",
    "estivessem","estivéssemos","estou","eu","foi","fomos","for","fora","foram","fôramos","forem","formos","fosse",
    "fossem","fôssemos","fui","há","haja","hajam","hajamos","hão","havemos","haver","hei","houve","houvemos","houver",
    "houvera","houverá","houveram","houvéramos","houverão","houverei","houverem","houveremos","houveria","houveriam",
    "houveríamos","houvermos","houvesse","houvessem","houvéssemos","isso","isto","já","lhe","lhes","mais","mas","me",
    "mesmo","meu","meus","minha","minhas","muito","na","não","nas","nem","no","nos","nós","nossa","nossas","nosso",
    "nossos","num","numa","o","os","ou","para","pela","pelas","pelo","pelos","por","qual","quando","que","quem",
    "são","se","seja","sejam","sejamos","sem","ser","será","serão","serei","seremos","seria","seriam","seríamos",
    "seu","seus","só","somos","sou","sua","suas","também","te","tem","tém","temos","tenha","tenham","tenhamos",
    "tenho","terá","terão","terei","teremos","teria","teriam","teríamos","teu","teus","teve","tinha","tinham",
    "tínhamos","tive","tivemos","tiver","tivera","tiveram","tivéramos","tiverem","tivermos","tivesse","tivessem",
    "tivéssemos","tu","tua","tuas","um","uma","você","vocês","vos",
];

lazy_static! {
    // Decimal numerals stay whole; other punctuation becomes single-character tokens.
    static ref RE: Regex = Regex::new(r"[0-9]+\.[0-9]+|[\p{L}\p{N}_]+|[^\s\p{L}\p{N}_]").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::Portuguese);
    static ref STOPWORDS: HashSet<String> = PUNCTUATION
        .chars()
        .map(|c| c.to_string())
        .chain(FUNCTION_WORDS.iter().map(|w| fold(w)))
        .collect();
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Compatibility-decompose and drop combining marks: "Coração" -> "Coracao".
pub fn fold(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Split into words, numerals and single punctuation characters.
pub fn split_words(text: &str) -> Vec<&str> {
    RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Replace every numeral token by the tokens of its spelled-out form.
pub fn expand_numerals<'a, I>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Vec::new();
    for token in tokens {
        match try_parse_number(token) {
            Some(numeral) => {
                let spelled = fold(&spell(&numeral));
                out.extend(split_words(&spelled).into_iter().map(str::to_string));
            }
            None => out.push(token.to_string()),
        }
    }
    out
}

/// Stem until the stemmer leaves the word unchanged. A single Snowball pass can
/// leave a stemmable suffix behind ("aniversari" -> "aniversar"), and indexed
/// terms must survive normalization unchanged.
pub fn stem(token: &str) -> String {
    let mut current = token.to_string();
    loop {
        let next = STEMMER.stem(&current);
        if next == current.as_str() {
            return current;
        }
        current = next.into_owned();
    }
}

fn stem_and_filter(token: &str) -> Option<String> {
    if is_stopword(token) || token.chars().count() < 2 { return None; }
    let root = stem(token);
    if root.chars().count() < 2 || is_stopword(&root) { return None; }
    Some(root)
}

/// Normalize text into index terms: lowercase, fold diacritics, tokenize, spell
/// numerals, stem (Portuguese) and drop stop words and one-character tokens.
/// The output depends only on `text`.
pub fn normalize(text: &str) -> Vec<String> {
    let folded = fold(&text.to_lowercase());
    expand_numerals(split_words(&folded))
        .iter()
        .filter_map(|t| stem_and_filter(t))
        .collect()
}

/// Absent fields normalize to no terms.
pub fn normalize_field(field: Option<&str>) -> Vec<String> {
    field.map(normalize).unwrap_or_default()
}
