//! Interactive search loop: `query --key=value --key=value`.

use anyhow::{anyhow, Result};
use std::io::{BufRead, Write};
use vitrine_core::filter::parse_predicates;
use vitrine_core::{ProductId, SearchIndex};

const OPTIONS: &str = "\
options (append to a query as --key=value):
  seller_id  title  category
  price_min  price_max  weight_min  weight_max
  express_delivery  min_quantity  prods_to_show
commands: -o lists options, -q quits
a line with only options lists matching products without ranking";

/// Split a line into the query text and its `--key=value` options.
pub fn parse_line(line: &str) -> Result<(String, Vec<(String, String)>)> {
    let mut parts = line.split("--");
    let query = parts.next().unwrap_or_default().trim().to_string();
    let mut options = Vec::new();
    for part in parts {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| anyhow!("option {part:?} is not key=value"))?;
        options.push((key.trim().to_string(), value.trim().to_string()));
    }
    Ok((query, options))
}

pub fn answer(index: &SearchIndex, line: &str, limit: usize) -> Result<Vec<ProductId>> {
    let (query, options) = parse_line(line)?;
    let pairs = options.iter().map(|(k, v)| (k.as_str(), v.as_str()));
    if query.is_empty() && !options.is_empty() {
        let predicates = parse_predicates(pairs)?;
        return Ok(index.browse(limit, &predicates));
    }
    Ok(index.search(&query, limit, pairs)?)
}

pub fn run<R: BufRead, W: Write>(index: &SearchIndex, limit: usize, input: R, mut out: W) -> Result<()> {
    writeln!(out, "type a query, -o for options, -q to quit")?;
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        match line {
            "" => continue,
            "-q" => break,
            "-o" => writeln!(out, "{OPTIONS}")?,
            _ => match answer(index, line, limit) {
                Ok(ids) => writeln!(out, ">>> returned products: {ids:?}")?,
                Err(e) => writeln!(out, ">>> error: {e}")?,
            },
        }
        out.flush()?;
    }
    Ok(())
}
