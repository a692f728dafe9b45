//! The page is old server-rendered HTML (uppercase `CLASS` attributes, layout
//! tables), so a handful of targeted regexes is enough to pull out the title
//! row, the "Registration Availability" table and the prerequisites block.

use course_watch::{RegistrationInfo, SeatCounts, SourceError};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TITLE_CELL: Regex =
        Regex::new(r#"(?is)<th[^>]*class\s*=\s*"?ddlabel"?[^>]*>(.*?)</th>"#).unwrap();
    static ref COUNT_CELL: Regex =
        Regex::new(r#"(?is)<td[^>]*class\s*=\s*"?dddefault"?[^>]*>\s*(-?\d+)\s*</td>"#).unwrap();
    static ref TABLE_END: Regex = Regex::new(r"(?i)</table>").unwrap();
    static ref CELL_END: Regex = Regex::new(r"(?i)</td>").unwrap();
    static ref LINE_BREAK: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
    static ref TAG: Regex = Regex::new(r"(?s)<[^>]*>").unwrap();
    static ref PREREQ_TOKEN: Regex = Regex::new(r#"\[[^\]]*\]|\([^\)]*\)|"[^"]*"|\S+"#).unwrap();
}

const AVAILABILITY_CAPTION: &str = "Registration Availability";
const PREREQ_LABEL: &str = "Prerequisites:";

/// Words that carry no information in a prerequisite listing
const FILLER_WORDS: [&str; 7] = [
    "undergraduate",
    "graduate",
    "level",
    "grade",
    "of",
    "minimum",
    "semester",
];

/// Section title, e.g. `Data Structures &amp; Algorithms - 12345 - CS 1332 - A`
/// becomes `Data Structures & Algorithms - 12345 - CS 1332 - A`.
pub fn parse_course_name(html: &str) -> Result<String, SourceError> {
    let cell = TITLE_CELL
        .captures(html)
        .ok_or_else(|| SourceError::Parse("no course title on page".to_string()))?;

    let name = html_to_text(&cell[1]).trim().to_string();
    if name.is_empty() {
        return Err(SourceError::Parse("empty course title".to_string()));
    }
    Ok(name)
}

/// Seat and waitlist counters from the "Registration Availability" table.
///
/// The table lists capacity, actual and remaining for seats, then the same
/// three for the waitlist. Negative remaining counts (over-enrolment) read as
/// zero vacancies.
pub fn parse_registration_info(html: &str) -> Result<RegistrationInfo, SourceError> {
    let start = html
        .find(AVAILABILITY_CAPTION)
        .ok_or_else(|| SourceError::Parse("no registration availability table".to_string()))?;
    let table = &html[start..];
    let table = TABLE_END
        .find(table)
        .map_or(table, |end| &table[..end.start()]);

    let values = COUNT_CELL
        .captures_iter(table)
        .map(|cell| cell[1].parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SourceError::Parse(format!("bad seat counter: {}", e)))?;

    if values.len() < 6 {
        return Err(SourceError::Parse(format!(
            "expected 6 seat counters, found {}",
            values.len()
        )));
    }

    Ok(RegistrationInfo {
        seats: seat_counts(&values[0..3]),
        waitlist: seat_counts(&values[3..6]),
    })
}

/// Prerequisite listing with filler words dropped, e.g.
/// `Undergraduate Semester level CS 1331 Minimum Grade of C` becomes
/// `CS 1331 C`.
pub fn parse_prerequisites(html: &str) -> Result<String, SourceError> {
    let start = html
        .find(PREREQ_LABEL)
        .ok_or_else(|| SourceError::Parse("no prerequisites section".to_string()))?;
    let block = &html[start + PREREQ_LABEL.len()..];
    let block = CELL_END
        .find(block)
        .map_or(block, |end| &block[..end.start()]);

    let cleaned = clean_prerequisites(&html_to_text(block));
    if cleaned.is_empty() {
        return Err(SourceError::Parse("empty prerequisites section".to_string()));
    }
    Ok(cleaned)
}

/// Strip markup and decode the few entities the page uses
pub fn html_to_text(fragment: &str) -> String {
    let text = LINE_BREAK.replace_all(fragment, "\n");
    let text = TAG.replace_all(&text, "");
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn clean_prerequisites(raw: &str) -> String {
    let block = raw
        .split_whitespace()
        .filter(|word| !is_filler(word))
        .collect::<Vec<_>>()
        .join(" ");

    PREREQ_TOKEN
        .find_iter(&block)
        .map(|token| token.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .replace("(Undergraduate ", "(")
}

fn is_filler(word: &str) -> bool {
    let word = word.to_lowercase();
    FILLER_WORDS.contains(&word.as_str())
}

fn seat_counts(values: &[i64]) -> SeatCounts {
    let count = |v: i64| u32::try_from(v.max(0)).unwrap_or(u32::MAX);
    SeatCounts {
        capacity: count(values[0]),
        taken: count(values[1]),
        vacant: count(values[2]),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const DETAIL_PAGE: &str = r#"
<table  CLASS="datadisplaytable" SUMMARY="This table is used to present the detailed class information." width="100%">
<tr>
<th CLASS="ddlabel" scope="row" >Data Structures &amp; Algorithms - 12345 - CS 1332 - A</th>
</tr>
<tr>
<td CLASS="dddefault">
<span class="fieldlabeltext">Associated Term: </span>Fall 2024
<br>
<span class="fieldlabeltext">Levels: </span>Undergraduate Semester
<br>
<table  CLASS="datadisplaytable" SUMMARY="This layout table is used to present the seating numbers." width="100%"><caption class="captiontext">Registration Availability</caption>
<tr>
<td CLASS="dddead">&nbsp;</td>
<th CLASS="ddheader" scope="col" ><span class="fieldlabeltext">Capacity</span></th>
<th CLASS="ddheader" scope="col" ><span class="fieldlabeltext">Actual</span></th>
<th CLASS="ddheader" scope="col" ><span class="fieldlabeltext">Remaining</span></th>
</tr>
<tr>
<th CLASS="ddlabel" scope="row" ><span class="fieldlabeltext">Seats</span></th>
<td CLASS="dddefault">150</td>
<td CLASS="dddefault">148</td>
<td CLASS="dddefault">2</td>
</tr>
<tr>
<th CLASS="ddlabel" scope="row" ><span class="fieldlabeltext">Waitlist Seats</span></th>
<td CLASS="dddefault">10</td>
<td CLASS="dddefault">10</td>
<td CLASS="dddefault">0</td>
</tr>
</table>
<br>
<span class="fieldlabeltext">Prerequisites: </span>
<br>
(Undergraduate Semester level CS 1331 Minimum Grade of C or Undergraduate Semester level CS 1371 Minimum Grade of C)
and Undergraduate Semester level MATH 1552 Minimum Grade of D
<br>
<br>
</td>
</tr>
</table>
"#;

    #[test]
    fn test_parse_course_name() {
        assert_eq!(
            parse_course_name(DETAIL_PAGE).unwrap(),
            "Data Structures & Algorithms - 12345 - CS 1332 - A"
        );
        let missing = "<html><body>No detailed class information found</body></html>";
        assert!(parse_course_name(missing).is_err());
    }

    #[test]
    fn test_parse_registration_info() {
        let info = parse_registration_info(DETAIL_PAGE).unwrap();
        assert_eq!(
            info.seats,
            SeatCounts {
                capacity: 150,
                taken: 148,
                vacant: 2
            }
        );
        assert_eq!(
            info.waitlist,
            SeatCounts {
                capacity: 10,
                taken: 10,
                vacant: 0
            }
        );
    }

    #[test]
    fn test_over_enrolled_section_has_no_vacancy() {
        let page = DETAIL_PAGE
            .replace(">148<", ">153<")
            .replace(">2</td>", ">-3</td>");
        let info = parse_registration_info(&page).unwrap();
        assert_eq!(info.seats.vacant, 0);
        assert!(!info.seats.has_vacancy());
    }

    #[test]
    fn test_short_availability_table_is_an_error() {
        let page = r#"<caption>Registration Availability</caption>
<td CLASS="dddefault">150</td><td CLASS="dddefault">148</td><td CLASS="dddefault">2</td></table>"#;
        assert!(matches!(
            parse_registration_info(page),
            Err(SourceError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_prerequisites() {
        assert_eq!(
            parse_prerequisites(DETAIL_PAGE).unwrap(),
            "(CS 1331 C or CS 1371 C) and MATH 1552 D"
        );
    }

    #[test]
    fn test_missing_prerequisites_is_an_error() {
        let page = DETAIL_PAGE.replace("Prerequisites:", "Restrictions:");
        assert!(parse_prerequisites(&page).is_err());
    }

    #[test]
    fn test_html_to_text() {
        assert_eq!(
            html_to_text("<b>A&amp;B</b><br/>&lt;x&gt;&nbsp;&quot;y&quot;"),
            "A&B\n<x> \"y\""
        );
    }
}
