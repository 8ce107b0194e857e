//! Heuristic decomposition of free-text address lines into street, locality
//! and region. This is where all the judgement calls live; the record builder
//! downstream is pure assembly.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::gazetteer::Gazetteer;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w\S*").unwrap());

/// Title-cases every word: first letter upper, rest of the word lower. The
/// register shouts in capitals, so this is applied uniformly even though it
/// mangles acronyms ("FC" becomes "Fc").
pub fn title_case(input: &str) -> String {
    WORD.replace_all(input, |caps: &regex::Captures<'_>| {
        let word = &caps[0];
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => {
                let mut out: String = first.to_uppercase().collect();
                out.push_str(&chars.as_str().to_lowercase());
                out
            }
            None => String::new(),
        }
    })
    .into_owned()
}

/// Street, locality and region inferred from one record's address lines.
/// Fields are already title-cased; absent parts stay absent.
#[derive(Debug, Clone, PartialEq)]
pub struct DecomposedAddress {
    pub street: String,
    pub locality: Option<String>,
    pub region: Option<String>,
}

pub struct AddressDecomposer {
    gazetteer: Arc<Gazetteer>,
}

impl AddressDecomposer {
    pub fn new(gazetteer: Arc<Gazetteer>) -> Self {
        Self { gazetteer }
    }

    /// Splits raw address lines into structured parts.
    ///
    /// The register routinely repeats the club name as the first address line
    /// and writes the county as its own line. The heuristic is:
    ///
    /// 1. drop blank lines, then drop the first line if it repeats the
    ///    organisation name (trimmed, case-sensitive),
    /// 2. scan for the first line that is a gazetteer region; that line
    ///    becomes the region and the line just before it, if any, the
    ///    locality,
    /// 3. with no region match, the last line is taken as the locality,
    /// 4. a resolver-supplied region always wins over the gazetteer,
    /// 5. whatever is left joins into the street.
    ///
    /// Consumed lines are removed by index, so a second line that merely
    /// shares the same text stays in the street.
    pub fn decompose(
        &self,
        organisation_name: &str,
        lines: &[&str],
        resolved_region: Option<&str>,
    ) -> DecomposedAddress {
        let mut working: Vec<&str> = lines
            .iter()
            .copied()
            .filter(|line| !line.trim().is_empty())
            .collect();

        if let Some(first) = working.first() {
            if first.trim() == organisation_name.trim() {
                working.remove(0);
            }
        }

        let mut region: Option<String> = None;
        let mut locality: Option<&str> = None;
        let mut matched_at: Option<usize> = None;
        for (index, line) in working.iter().enumerate() {
            if let Some(name) = self.gazetteer.find(line.trim()) {
                region = Some(name.to_string());
                if index > 0 {
                    locality = Some(working[index - 1]);
                }
                matched_at = Some(index);
                break;
            }
        }

        match matched_at {
            Some(index) => {
                working.remove(index);
                if index > 0 {
                    working.remove(index - 1);
                }
            }
            None => {
                if let Some(last) = working.pop() {
                    locality = Some(last);
                }
            }
        }

        let region = resolved_region.map(str::to_string).or(region);

        DecomposedAddress {
            street: title_case(&working.join(", ")),
            locality: locality.map(title_case),
            region: region.as_deref().map(title_case),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decomposer_with(regions: &[&str]) -> AddressDecomposer {
        let gazetteer = Gazetteer::from_names(regions.iter().map(|r| r.to_string()));
        AddressDecomposer::new(Arc::new(gazetteer))
    }

    #[test]
    fn strips_duplicated_name_and_finds_region_and_locality() {
        let decomposer = decomposer_with(&["Kentshire"]);
        let parts = decomposer.decompose(
            "Riverside FC",
            &["Riverside FC", "Main Street", "Riverton", "Kentshire"],
            None,
        );

        assert_eq!(parts.street, "Main Street");
        assert_eq!(parts.locality.as_deref(), Some("Riverton"));
        assert_eq!(parts.region.as_deref(), Some("Kentshire"));
    }

    #[test]
    fn resolver_override_beats_gazetteer_match() {
        let decomposer = decomposer_with(&["Kentshire"]);
        let parts = decomposer.decompose(
            "Riverside FC",
            &["Riverside FC", "Main Street", "Riverton", "Kentshire"],
            Some("Overcounty"),
        );

        assert_eq!(parts.street, "Main Street");
        assert_eq!(parts.locality.as_deref(), Some("Riverton"));
        assert_eq!(parts.region.as_deref(), Some("Overcounty"));
    }

    #[test]
    fn region_on_the_first_line_leaves_no_locality() {
        let decomposer = decomposer_with(&["Kentshire"]);
        let parts = decomposer.decompose("Riverside FC", &["Kentshire", "Main Street"], None);

        assert_eq!(parts.street, "Main Street");
        assert_eq!(parts.locality, None);
        assert_eq!(parts.region.as_deref(), Some("Kentshire"));
    }

    #[test]
    fn no_region_match_takes_last_line_as_locality() {
        let decomposer = decomposer_with(&["Kentshire"]);
        let parts = decomposer.decompose("Riverside FC", &["12 High Street", "Riverton"], None);

        assert_eq!(parts.street, "12 High Street");
        assert_eq!(parts.locality.as_deref(), Some("Riverton"));
        assert_eq!(parts.region, None);
    }

    #[test]
    fn gazetteer_match_trims_and_ignores_case() {
        let decomposer = decomposer_with(&["Kentshire"]);
        let parts = decomposer.decompose("Riverside FC", &["Main Street", "  KENTSHIRE "], None);

        assert_eq!(parts.region.as_deref(), Some("Kentshire"));
        assert_eq!(parts.locality.as_deref(), Some("Main Street"));
        assert_eq!(parts.street, "");
    }

    #[test]
    fn duplicate_text_removes_only_the_matched_instance() {
        let decomposer = decomposer_with(&["Essex"]);
        let parts = decomposer.decompose(
            "Riverside FC",
            &["Essex House", "Essex", "Chelmsford", "Essex"],
            None,
        );

        assert_eq!(parts.region.as_deref(), Some("Essex"));
        assert_eq!(parts.locality.as_deref(), Some("Essex House"));
        assert_eq!(parts.street, "Chelmsford, Essex");
    }

    #[test]
    fn name_strip_is_case_sensitive_but_tolerates_padding() {
        let decomposer = decomposer_with(&["Kentshire"]);

        let shouted = decomposer.decompose("Riverside FC", &["RIVERSIDE FC", "Kentshire"], None);
        assert_eq!(shouted.locality.as_deref(), Some("Riverside Fc"));

        let padded = decomposer.decompose(" Riverside FC ", &["Riverside FC", "Riverton"], None);
        assert_eq!(padded.street, "");
        assert_eq!(padded.locality.as_deref(), Some("Riverton"));
    }

    #[test]
    fn whitespace_only_lines_count_as_blank() {
        let decomposer = decomposer_with(&["Kentshire"]);
        let parts = decomposer.decompose("Riverside FC", &["   ", "Main Street", "", "Kentshire"], None);

        assert_eq!(parts.street, "");
        assert_eq!(parts.locality.as_deref(), Some("Main Street"));
        assert_eq!(parts.region.as_deref(), Some("Kentshire"));
    }

    #[test]
    fn no_lines_yield_empty_street_and_resolver_still_supplies_region() {
        let decomposer = decomposer_with(&["Kentshire"]);

        let bare = decomposer.decompose("Riverside FC", &[], None);
        assert_eq!(bare.street, "");
        assert_eq!(bare.locality, None);
        assert_eq!(bare.region, None);

        let enriched = decomposer.decompose("Riverside FC", &[], Some("overcounty"));
        assert_eq!(enriched.region.as_deref(), Some("Overcounty"));
        assert_eq!(enriched.locality, None);
    }

    #[test]
    fn decomposition_is_deterministic_for_the_same_inputs() {
        let decomposer = decomposer_with(&["Kentshire"]);
        let lines = ["Riverside FC", "Main Street", "Riverton", "Kentshire"];

        let first = decomposer.decompose("Riverside FC", &lines, Some("Overcounty"));
        let second = decomposer.decompose("Riverside FC", &lines, Some("Overcounty"));
        assert_eq!(first, second);
    }

    #[test]
    fn title_case_lowercases_the_tail_of_each_word() {
        assert_eq!(title_case("MAIN STREET"), "Main Street");
        assert_eq!(title_case("riverside fc"), "Riverside Fc");
        assert_eq!(title_case("stratford-UPON-avon"), "Stratford-upon-avon");
        assert_eq!(title_case("12 o'brien road"), "12 O'brien Road");
        assert_eq!(title_case(""), "");
    }
}
