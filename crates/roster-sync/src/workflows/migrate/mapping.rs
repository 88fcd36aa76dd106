use crate::workflows::headers::{HeaderRow, SynonymTable};
use serde::Serialize;

/// How a template column found its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Direct,
    Synonym,
    Unmatched,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnBinding {
    /// Zero-based position in the generated sheet.
    pub position: usize,
    pub header: String,
    /// Column the header occupies in the template sheet.
    pub template_column: usize,
    pub source_column: Option<usize>,
    pub matched_by: MatchKind,
}

/// Template column -> source column bindings, in template order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ColumnMapping {
    bindings: Vec<ColumnBinding>,
}

impl ColumnMapping {
    pub fn bindings(&self) -> &[ColumnBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn source_for(&self, position: usize) -> Option<usize> {
        self.bindings
            .get(position)
            .and_then(|binding| binding.source_column)
    }

    pub fn unmatched(&self) -> impl Iterator<Item = &ColumnBinding> {
        self.bindings
            .iter()
            .filter(|binding| binding.source_column.is_none())
    }
}

/// Binds every template header to a source column: a direct key match wins, then
/// the key's synonyms in declaration order. Headers with no match stay unbound.
pub fn map_columns(
    template: &HeaderRow,
    source: &HeaderRow,
    synonyms: &SynonymTable,
) -> ColumnMapping {
    let lookup = source.key_lookup();

    let bindings = template
        .headers
        .iter()
        .enumerate()
        .map(|(position, header)| {
            let direct = lookup.get(header.key.as_str()).copied();
            let (source_column, matched_by) = match direct {
                Some(column) => (Some(column), MatchKind::Direct),
                None => synonyms
                    .alternates(&header.key)
                    .iter()
                    .find_map(|alt| lookup.get(alt.as_str()).copied())
                    .map_or((None, MatchKind::Unmatched), |column| {
                        (Some(column), MatchKind::Synonym)
                    }),
            };

            ColumnBinding {
                position,
                header: header.text.clone(),
                template_column: header.column,
                source_column,
                matched_by,
            }
        })
        .collect();

    ColumnMapping { bindings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::headers::Header;

    fn header_row(texts: &[&str]) -> HeaderRow {
        HeaderRow {
            row: 0,
            headers: texts
                .iter()
                .enumerate()
                .map(|(column, text)| Header::new(column, *text))
                .collect(),
        }
    }

    fn profile_synonyms() -> SynonymTable {
        SynonymTable::new()
            .with("registrationnumber", ["regno"])
            .with("geeksforgeekslink", ["gfglink"])
    }

    #[test]
    fn binds_by_direct_and_synonym_match() {
        let source = header_row(&["Reg No", "Name", "GFG Link"]);
        let template = header_row(&["Registration Number", "Name", "GeeksforGeeks Link"]);
        let mapping = map_columns(&template, &source, &profile_synonyms());

        let kinds: Vec<_> = mapping
            .bindings()
            .iter()
            .map(|binding| (binding.source_column, binding.matched_by))
            .collect();
        assert_eq!(
            kinds,
            [
                (Some(0), MatchKind::Synonym),
                (Some(1), MatchKind::Direct),
                (Some(2), MatchKind::Synonym),
            ]
        );
    }

    #[test]
    fn direct_match_beats_synonym() {
        let source = header_row(&["Reg No", "Registration Number"]);
        let template = header_row(&["registration_number"]);
        let mapping = map_columns(&template, &source, &profile_synonyms());
        assert_eq!(mapping.source_for(0), Some(1));
        assert_eq!(mapping.bindings()[0].matched_by, MatchKind::Direct);
    }

    #[test]
    fn synonyms_follow_declaration_order() {
        let synonyms = SynonymTable::new().with("registrationnumber", ["regid", "regno"]);
        let source = header_row(&["Reg No", "Reg ID"]);
        let template = header_row(&["Registration Number"]);
        let mapping = map_columns(&template, &source, &synonyms);
        assert_eq!(mapping.source_for(0), Some(1));
    }

    #[test]
    fn unmatched_and_symbol_only_headers_stay_unbound() {
        let source = header_row(&["Name", "--"]);
        let template = header_row(&["Branch", "##", "Name"]);
        let mapping = map_columns(&template, &source, &SynonymTable::new());
        let unmatched: Vec<_> = mapping.unmatched().map(|b| b.header.as_str()).collect();
        assert_eq!(unmatched, ["Branch", "##"]);
        assert_eq!(mapping.source_for(2), Some(0));
        assert_eq!(mapping.len(), 3);
    }

    #[test]
    fn binding_keeps_template_column_positions() {
        let source = header_row(&["Name"]);
        let template = HeaderRow {
            row: 3,
            headers: vec![Header::new(2, "Name"), Header::new(5, "Email")],
        };
        let mapping = map_columns(&template, &source, &SynonymTable::new());
        assert_eq!(mapping.bindings()[1].position, 1);
        assert_eq!(mapping.bindings()[1].template_column, 5);
    }
}
