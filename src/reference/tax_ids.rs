//! Tax ID Reference Table
//!
//! Parses the static markdown table of billing tax-ID formats into rows for
//! display next to the billing address form. The table ships with the
//! application; rows that do not parse are skipped.

/// One supported tax-ID format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxIdFormat {
    /// Machine identifier, e.g. `eu_vat`.
    pub code: String,
    /// Human-readable description.
    pub description: String,
    /// Example value in the expected shape.
    pub example: String,
}

/// Parse a pipe-delimited markdown table into data rows.
///
/// The header row and the `---` separator row are skipped, as is any row
/// with fewer than three cells. Cell text is trimmed. If the table has no
/// separator row, every row is treated as data.
pub fn parse_table(text: &str) -> Vec<TaxIdFormat> {
    let rows: Vec<Vec<String>> = text
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('|'))
        .map(split_row)
        .collect();

    let separator = rows.iter().position(|cells| {
        !cells.is_empty()
            && cells.iter().all(|c| {
                !c.is_empty() && c.chars().all(|ch| ch == '-' || ch == ':')
            })
    });
    let data = match separator {
        Some(i) => &rows[i + 1..],
        None => &rows[..],
    };

    data.iter()
        .filter(|cells| cells.len() >= 3)
        .map(|cells| TaxIdFormat {
            code: cells[0].clone(),
            description: cells[1].clone(),
            example: cells[2].clone(),
        })
        .collect()
}

fn split_row(line: &str) -> Vec<String> {
    line.trim_matches('|')
        .split('|')
        .map(|cell| cell.trim().to_string())
        .collect()
}

/// Built-in table shown in the billing view.
const TAX_ID_TABLE: &str = "\
| Code     | Description                               | Example           |
|----------|-------------------------------------------|-------------------|
| ad_nrt   | Andorra NRT number                        | A-123456-Z        |
| ae_trn   | United Arab Emirates TRN                  | 123456789012345   |
| au_abn   | Australian Business Number                | 12345678912       |
| br_cnpj  | Brazilian CNPJ number                     | 01.234.456/5432-10 |
| ca_bn    | Canadian BN                               | 123456789         |
| ch_vat   | Switzerland VAT number                    | CHE-123.456.789 MWST |
| eu_vat   | European VAT number                       | DE123456789       |
| gb_vat   | United Kingdom VAT number                 | GB123456789       |
| in_gst   | Indian GST number                         | 12ABCDE3456FGZH   |
| jp_cn    | Japanese Corporate Number                 | 1234567891234     |
| mx_rfc   | Mexican RFC number                        | ABC010203AB9      |
| no_vat   | Norwegian VAT number                      | 123456789MVA      |
| nz_gst   | New Zealand GST number                    | 123456789         |
| sg_gst   | Singaporean GST                           | M12345678X        |
| us_ein   | United States EIN                         | 12-3456789        |
";

lazy_static::lazy_static! {
    /// Parsed built-in tax-ID reference list.
    pub static ref TAX_ID_FORMATS: Vec<TaxIdFormat> = parse_table(TAX_ID_TABLE);
}
