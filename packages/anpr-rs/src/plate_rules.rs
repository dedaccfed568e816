//! Plate normalization: canonicalize raw OCR text, repair look-alike
//! characters by zone, then match against the recognized plate grammars.
use regex::Regex;
use std::sync::OnceLock;

/// Ordered plate grammars. Earlier entries win when several could match.
static PLATE_GRAMMARS: OnceLock<Vec<PlateGrammar>> = OnceLock::new();

/// One recognized plate layout.
#[derive(Debug)]
pub struct PlateGrammar {
  pub name: &'static str,
  pub example: &'static str,
  pattern: Regex,
}

impl PlateGrammar {
  fn new(name: &'static str, example: &'static str, pattern: &str) -> Self {
    Self {
      name,
      example,
      pattern: Regex::new(&format!("^{pattern}$")).expect("plate grammar patterns are valid"),
    }
  }

  /// Number of characters in a plate of this grammar.
  pub fn width(&self) -> usize {
    self.example.len()
  }

  /// True if `text` is exactly one plate of this grammar.
  pub fn is_full_match(&self, text: &str) -> bool {
    self.pattern.is_match(text)
  }
}

pub fn plate_grammars() -> &'static [PlateGrammar] {
  PLATE_GRAMMARS.get_or_init(|| {
    vec![
      PlateGrammar::new("LL-DD-LL-DDDD", "KA01AB1234", r"[A-Z]{2}\d{2}[A-Z]{2}\d{4}"),
      PlateGrammar::new("LL-DD-L-DDDD", "KA01A1234", r"[A-Z]{2}\d{2}[A-Z]\d{4}"),
      PlateGrammar::new("LL-D-LL-DDDD", "KA1AB1234", r"[A-Z]{2}\d[A-Z]{2}\d{4}"),
      PlateGrammar::new("LL-D-L-DDDD", "KA1A1234", r"[A-Z]{2}\d[A-Z]\d{4}"),
      PlateGrammar::new("LL-DD-DDDD", "KA011234", r"[A-Z]{2}\d{2}\d{4}"),
    ]
  })
}

/// A validated plate and the grammar it matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateMatch {
  pub plate: String,
  pub grammar: &'static str,
}

/// Digit read where a region-code letter belongs.
fn letter_for_digit(c: char) -> char {
  match c {
    '0' => 'O',
    '1' => 'I',
    '2' => 'Z',
    '5' => 'S',
    '8' => 'B',
    other => other,
  }
}

/// Letter read where a digit belongs.
fn digit_for_letter(c: char) -> char {
  match c {
    'O' => '0',
    'I' => '1',
    'Z' => '2',
    'S' => '5',
    'B' => '8',
    other => other,
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
  RegionCode,
  Digits,
  Series,
}

const REGION_CODE_LEN: usize = 2;
const DISTRICT_END: usize = 4;
const SERIAL_LEN: usize = 4;

fn zone_of(index: usize, len: usize) -> Zone {
  if index < REGION_CODE_LEN {
    Zone::RegionCode
  } else if index < DISTRICT_END || index + SERIAL_LEN >= len {
    Zone::Digits
  } else {
    Zone::Series
  }
}

/// Uppercases and keeps only `A-Z` and `0-9`.
pub fn canonicalize(raw: &str) -> String {
  raw
    .chars()
    .flat_map(char::to_uppercase)
    .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    .collect()
}

/// Swaps look-alike characters by position on one candidate plate.
///
/// The region code (first two characters) only turns digits into letters.
/// The district code (next two) and the serial (last four) only turn
/// letters into digits. Series letters in between are left as read.
pub fn repair_characters(canonical: &str) -> String {
  let len = canonical.chars().count();
  canonical
    .chars()
    .enumerate()
    .map(|(i, c)| match zone_of(i, len) {
      Zone::RegionCode if c.is_ascii_digit() => letter_for_digit(c),
      Zone::Digits if c.is_ascii_alphabetic() => digit_for_letter(c),
      _ => c,
    })
    .collect()
}

/// Finds the highest-priority grammar present anywhere in `raw`.
///
/// Each grammar-width window of the canonical text is repaired on its own,
/// so zones line up with the candidate plate rather than with any noise
/// around it. Within a grammar the leftmost window wins.
pub fn match_plate(raw: &str) -> Option<PlateMatch> {
  let canonical = canonicalize(raw);

  plate_grammars().iter().find_map(|grammar| {
    let width = grammar.width();
    if canonical.len() < width {
      return None;
    }
    (0..=canonical.len() - width).find_map(|start| {
      let candidate = repair_characters(&canonical[start..start + width]);
      grammar.is_full_match(&candidate).then(|| PlateMatch {
        plate: candidate,
        grammar: grammar.name,
      })
    })
  })
}

/// Returns the normalized plate, or an empty string when nothing matches.
pub fn normalize_plate(raw: &str) -> String {
  match_plate(raw).map(|m| m.plate).unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_canonicalize_strips_separators_and_symbols() {
    assert_eq!(canonicalize("ka 01-ab 1234"), "KA01AB1234");
    assert_eq!(canonicalize("[KA.01] ab\t1234!"), "KA01AB1234");
    assert_eq!(canonicalize("@@@@"), "");
  }

  #[test]
  fn test_repair_region_code_digits() {
    assert_eq!(repair_characters("5K01AB1234"), "SK01AB1234");
    assert_eq!(repair_characters("8201AB1234"), "BZ01AB1234");
    // 3 has no look-alike letter
    assert_eq!(repair_characters("3A01AB1234"), "3A01AB1234");
  }

  #[test]
  fn test_repair_district_and_serial_letters() {
    assert_eq!(repair_characters("KAO1AB12S4"), "KA01AB1254");
    assert_eq!(repair_characters("KA01ABIZ3B"), "KA01AB1238");
  }

  #[test]
  fn test_series_letters_are_kept() {
    assert_eq!(repair_characters("KA05SB1234"), "KA05SB1234");
  }

  #[test]
  fn test_normalize_basic() {
    assert_eq!(normalize_plate("KA01AB1234"), "KA01AB1234");
    assert_eq!(normalize_plate("ka 01-ab 1234"), "KA01AB1234");
  }

  #[test]
  fn test_normalize_repairs_before_matching() {
    assert_eq!(normalize_plate("KA0IAB1234"), "KA01AB1234");
    assert_eq!(normalize_plate("K4 O1 AB 1234"), "");
  }

  #[test]
  fn test_normalize_empty_and_symbols() {
    assert_eq!(normalize_plate(""), "");
    assert_eq!(normalize_plate("@@@@"), "");
  }

  #[test]
  fn test_each_grammar() {
    let cases = [
      ("KA01AB1234", "LL-DD-LL-DDDD"),
      ("KA01A1234", "LL-DD-L-DDDD"),
      ("KA1AB1234", "LL-D-LL-DDDD"),
      ("KA1A1234", "LL-D-L-DDDD"),
      ("KA011234", "LL-DD-DDDD"),
    ];
    for (plate, grammar) in cases {
      let m = match_plate(plate).unwrap_or_else(|| panic!("no match for {plate}"));
      assert_eq!(m.plate, plate);
      assert_eq!(m.grammar, grammar, "wrong grammar for {plate}");
    }
  }

  #[test]
  fn test_examples_fully_match_their_grammar() {
    for grammar in plate_grammars() {
      assert!(grammar.is_full_match(grammar.example), "{}", grammar.name);
    }
  }

  #[test]
  fn test_priority_beats_position() {
    // The shorter layout appears first, but the full layout has priority.
    assert_eq!(normalize_plate("XY011234 KA01AB1234"), "KA01AB1234");
  }

  #[test]
  fn test_leftmost_match_within_grammar() {
    assert_eq!(normalize_plate("KA01AB1234 MH12DE1433"), "KA01AB1234");
  }

  #[test]
  fn test_surrounding_noise_is_ignored() {
    assert_eq!(normalize_plate("IND KA 01 AB 1234"), "KA01AB1234");
  }

  #[test]
  fn test_prefix_noise_does_not_shift_zones() {
    // "IND" must not push the series letter into the serial zone.
    assert_eq!(normalize_plate("IND KA 1B 1234"), normalize_plate("KA 1B 1234"));
    assert_eq!(normalize_plate("IND KA 1B 1234"), "KA181234");
    assert_eq!(normalize_plate("IND KA 1S AB 1234"), "KA15AB1234");
  }

  #[test]
  fn test_grammar_width_matches_example() {
    let widths: Vec<_> = plate_grammars().iter().map(PlateGrammar::width).collect();
    assert_eq!(widths, [10, 9, 9, 8, 8]);
    assert!(!plate_grammars()[0].is_full_match("XKA01AB1234"));
  }

  #[test]
  fn test_no_partial_credit() {
    assert_eq!(normalize_plate("KA01AB12"), "");
    assert_eq!(normalize_plate("9999999999"), "");
  }

  #[test]
  fn test_idempotent() {
    let inputs = [
      "KA01AB1234",
      "ka 01-ab 1234",
      "KA0IAB1234",
      "MH 12 DE 1433",
      "KA1SB1234",
      "dl 8c af 5030",
      "XY011234 KA01AB1234",
      "IND KA 1B 1234",
      "IND KA 1S AB 1234",
      "",
      "@@@@",
    ];
    for input in inputs {
      let once = normalize_plate(input);
      assert_eq!(normalize_plate(&once), once, "not idempotent for {input:?}");
    }
  }
}
