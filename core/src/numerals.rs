//! Numerals spelled out as Brazilian Portuguese words.
//!
//! The normalizer rewrites numeric tokens through [`try_parse_number`] and
//! [`spell`], so that "1930" and "mil novecentos e trinta" share terms.

const UNITS: [&str; 20] = [
    "zero", "um", "dois", "três", "quatro", "cinco", "seis", "sete", "oito", "nove",
    "dez", "onze", "doze", "treze", "quatorze", "quinze", "dezesseis", "dezessete", "dezoito", "dezenove",
];

const TENS: [&str; 10] = [
    "", "", "vinte", "trinta", "quarenta", "cinquenta", "sessenta", "setenta", "oitenta", "noventa",
];

const HUNDREDS: [&str; 10] = [
    "", "cento", "duzentos", "trezentos", "quatrocentos", "quinhentos", "seiscentos", "setecentos", "oitocentos", "novecentos",
];

/// (singular, plural) per power of one thousand, short scale.
const SCALES: [(&str, &str); 7] = [
    ("", ""),
    ("mil", "mil"),
    ("milhão", "milhões"),
    ("bilhão", "bilhões"),
    ("trilhão", "trilhões"),
    ("quatrilhão", "quatrilhões"),
    ("quintilhão", "quintilhões"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Numeral {
    Integer(u64),
    /// `whole.fraction`; the fraction keeps its digits verbatim (leading zeros are spoken).
    Decimal { whole: u64, fraction: String },
}

/// Parse an ASCII numeral token (`1930`, `007`, `2.5`). Anything else is `None`
/// and the caller keeps the raw token.
pub fn try_parse_number(token: &str) -> Option<Numeral> {
    let (whole, fraction) = match token.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (token, None),
    };
    if !is_digits(whole) {
        return None;
    }
    let whole: u64 = whole.parse().ok()?;
    match fraction {
        None => Some(Numeral::Integer(whole)),
        Some(f) if is_digits(f) => {
            let significant = f.trim_start_matches('0');
            if !significant.is_empty() && significant.parse::<u64>().is_err() {
                return None;
            }
            Some(Numeral::Decimal { whole, fraction: f.to_string() })
        }
        Some(_) => None,
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Spell a parsed numeral. Separators are emitted verbatim, e.g. `1930` becomes
/// `"mil, novecentos e trinta"`.
pub fn spell(numeral: &Numeral) -> String {
    match numeral {
        Numeral::Integer(n) => spell_integer(*n),
        Numeral::Decimal { whole, fraction } => {
            let mut words = vec![spell_integer(*whole), "vírgula".to_string()];
            let significant = fraction.trim_start_matches('0');
            let zeros = fraction.len() - significant.len();
            words.extend(std::iter::repeat(UNITS[0].to_string()).take(zeros));
            if let Ok(n) = significant.parse::<u64>() {
                words.push(spell_integer(n));
            }
            words.join(" ")
        }
    }
}

pub fn spell_integer(n: u64) -> String {
    if n == 0 {
        return UNITS[0].to_string();
    }
    // Non-zero thousand groups, most significant first.
    let mut groups: Vec<(usize, u64)> = Vec::new();
    let mut rest = n;
    let mut scale = 0;
    while rest > 0 {
        let value = rest % 1000;
        if value > 0 {
            groups.push((scale, value));
        }
        rest /= 1000;
        scale += 1;
    }
    groups.reverse();

    let mut out = String::new();
    for (i, &(scale, value)) in groups.iter().enumerate() {
        if i > 0 {
            let last = i == groups.len() - 1;
            if last && (value < 100 || value % 100 == 0) {
                out.push_str(" e ");
            } else {
                out.push_str(", ");
            }
        }
        out.push_str(&group_words(scale, value));
    }
    out
}

fn group_words(scale: usize, value: u64) -> String {
    match scale {
        0 => below_thousand(value),
        1 if value == 1 => SCALES[1].0.to_string(),
        1 => format!("{} {}", below_thousand(value), SCALES[1].1),
        _ => {
            let (singular, plural) = SCALES[scale];
            if value == 1 {
                format!("{} {}", UNITS[1], singular)
            } else {
                format!("{} {}", below_thousand(value), plural)
            }
        }
    }
}

fn below_thousand(n: u64) -> String {
    if n == 100 {
        return "cem".to_string();
    }
    let n = n as usize;
    let mut parts: Vec<&str> = Vec::with_capacity(3);
    if n >= 100 {
        parts.push(HUNDREDS[n / 100]);
    }
    let rest = n % 100;
    if rest >= 20 {
        parts.push(TENS[rest / 10]);
        if rest % 10 > 0 {
            parts.push(UNITS[rest % 10]);
        }
    } else if rest > 0 {
        parts.push(UNITS[rest]);
    }
    parts.join(" e ")
}
