// Rendering of the ranked answers for admins.

use crate::survey::config_reader::KindConfig;
use crate::survey::*;

use serde_json::json;
use serde_json::Value as JSValue;
use std::io::Write;
use text_diff::print_diff;

fn format_percentage(p: f64) -> String {
    format!("{:.2}", p)
}

fn kind_name(kind: QuestionKind) -> JSValue {
    serde_json::to_value(KindConfig::from(kind)).unwrap_or(JSValue::Null)
}

pub fn summary_js(survey_name: &str, reports: &[QuestionReport]) -> JSValue {
    let mut results: Vec<JSValue> = Vec::new();
    for r in reports.iter() {
        let ranking: Vec<JSValue> = r
            .ranking
            .iter()
            .map(|c| {
                json!({
                    "label": c.label,
                    "votes": c.voter_count.to_string(),
                    "percentage": format_percentage(c.percentage),
                })
            })
            .collect();
        results.push(json!({
            "question": r.number,
            "prompt": r.prompt,
            "kind": kind_name(r.kind),
            "totalVotes": r.total_votes.to_string(),
            "ranking": ranking,
        }));
    }
    json!({ "survey": survey_name, "results": results })
}

/// Logs the report, one line per choice.
pub fn log_report(reports: &[QuestionReport]) {
    for r in reports.iter() {
        info!(
            "Question {} ({} answers): {}",
            r.number, r.total_votes, r.prompt
        );
        for c in r.ranking.iter() {
            info!(
                "      {} {} ({}%)",
                c.voter_count,
                c.label,
                format_percentage(c.percentage)
            );
        }
    }
}

pub fn write_text<W: Write>(reports: &[QuestionReport], mut out: W) -> std::io::Result<()> {
    for r in reports.iter() {
        writeln!(out, "{}. {} ({} answers)", r.number, r.prompt, r.total_votes)?;
        if r.ranking.is_empty() {
            writeln!(out, "    (no answers)")?;
        }
        for c in r.ranking.iter() {
            writeln!(
                out,
                "    {:>6}%  {:>4}  {}",
                format_percentage(c.percentage),
                c.voter_count,
                c.label
            )?;
        }
    }
    Ok(())
}

pub fn write_csv<W: Write>(reports: &[QuestionReport], out: W) -> SurveyResult<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["question", "prompt", "label", "votes", "percentage"])
        .context(CsvSnafu {})?;
    for r in reports.iter() {
        for c in r.ranking.iter() {
            wtr.write_record([
                r.number.to_string(),
                r.prompt.clone(),
                c.label.clone(),
                c.voter_count.to_string(),
                format_percentage(c.percentage),
            ])
            .context(CsvSnafu {})?;
        }
    }
    wtr.flush().context(WritingReportSnafu {})?;
    Ok(())
}

pub fn write_csv_file(reports: &[QuestionReport], path: &str) -> SurveyResult<()> {
    let file = fs::File::create(path).context(CreatingCsvSnafu { path })?;
    write_csv(reports, file)?;
    info!("Saved CSV report to {}", path);
    Ok(())
}

/// Writes the JSON summary to a file, or to the standard output for `stdout`.
pub fn write_summary(js: &JSValue, out: &str) -> SurveyResult<()> {
    let pretty = serde_json::to_string_pretty(js).context(SerializingJsonSnafu { path: out })?;
    if out == "stdout" {
        println!("{}", pretty);
    } else {
        fs::write(out, pretty).context(WritingJsonSnafu { path: out })?;
        info!("Saved summary to {}", out);
    }
    Ok(())
}

/// Compares the summary with a reference summary and fails on any difference.
pub fn check_reference(js: &JSValue, reference_path: &str) -> SurveyResult<()> {
    let contents =
        fs::read_to_string(reference_path).context(OpeningJsonSnafu { path: reference_path })?;
    let reference: JSValue = serde_json::from_str(contents.as_str())
        .context(ParsingJsonSnafu { path: reference_path })?;
    let pretty_ref = serde_json::to_string_pretty(&reference).context(SerializingJsonSnafu {
        path: reference_path,
    })?;
    let pretty =
        serde_json::to_string_pretty(js).context(SerializingJsonSnafu { path: "summary" })?;
    if pretty_ref != pretty {
        warn!("Found differences with the reference summary");
        print_diff(pretty_ref.as_str(), pretty.as_str(), "\n");
        whatever!(
            "Difference detected between calculated summary and reference summary {}",
            reference_path
        )
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_ledger::builder::SurveyBuilder;

    fn reports() -> Vec<QuestionReport> {
        let mut survey = SurveyBuilder::new()
            .single_choice(
                "Colour?",
                &["Red".to_string(), "Green".to_string(), "Blue".to_string()],
            )
            .unwrap()
            .free_text("Why?")
            .unwrap()
            .build()
            .unwrap();
        for (voter, answer) in [("a", "blue"), ("b", "blue"), ("c", "blue"), ("d", "red")] {
            survey.answer(1, Some(answer), voter).unwrap();
        }
        survey.report()
    }

    #[test]
    fn summary_contents() {
        let js = summary_js("Test", &reports());
        assert_eq!(js["survey"], "Test");
        let q1 = &js["results"][0];
        assert_eq!(q1["kind"], "singleChoice");
        assert_eq!(q1["totalVotes"], "4");
        assert_eq!(q1["ranking"][0]["label"], "Blue");
        assert_eq!(q1["ranking"][0]["percentage"], "75.00");
        assert_eq!(q1["ranking"][1]["label"], "Red");
        assert_eq!(q1["ranking"][2]["percentage"], "0.00");
        let q2 = &js["results"][1];
        assert_eq!(q2["kind"], "freeText");
        assert_eq!(q2["ranking"].as_array().map(|a| a.len()), Some(0));
    }

    #[test]
    fn csv_contents() {
        let mut buf: Vec<u8> = Vec::new();
        write_csv(&reports(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "question,prompt,label,votes,percentage");
        assert_eq!(lines[1], "1,Colour?,Blue,3,75.00");
        assert_eq!(lines[2], "1,Colour?,Red,1,25.00");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv").display().to_string();
        write_csv_file(&reports(), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("question,prompt,label,votes,percentage\n"));

        let missing = dir.path().join("nowhere").join("report.csv");
        let res = write_csv_file(&reports(), &missing.display().to_string());
        assert!(matches!(res, Err(SurveyError::CreatingCsv { .. })));
    }

    #[test]
    fn text_contents() {
        let mut buf: Vec<u8> = Vec::new();
        write_text(&reports(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("1. Colour? (4 answers)\n"));
        assert!(text.contains("75.00%"));
        assert!(text.contains("2. Why? (0 answers)\n    (no answers)\n"));
    }

    #[test]
    fn reference_check() {
        let dir = tempfile::tempdir().unwrap();
        let js = summary_js("Test", &reports());
        let path = dir.path().join("reference.json");
        let path_s = path.display().to_string();
        write_summary(&js, &path_s).unwrap();
        check_reference(&js, &path_s).unwrap();

        let other = summary_js("Other", &reports());
        assert!(matches!(
            check_reference(&other, &path_s),
            Err(SurveyError::Whatever { .. })
        ));
    }
}
