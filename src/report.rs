//! Consolidated section report rendered to a standalone HTML file

use anyhow::Context;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::calc::{self, LetterGrade};

pub const REPORTS_DIR: &str = "reports";
/// Share links stay valid for one hour.
pub const SHARE_TTL_MS: i64 = 3_600_000;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportStudent {
    pub id: i64,
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportSession {
    pub id: i64,
    pub title: Option<String>,
    pub number: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportCompetency {
    pub id: i64,
    pub session_id: i64,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportAbility {
    pub id: i64,
    pub competency_id: i64,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportCriterion {
    pub id: i64,
    pub ability_id: i64,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportValue {
    pub student_id: i64,
    pub criterion_id: i64,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportObservation {
    pub student_id: i64,
    pub ability_id: i64,
    pub observation: String,
}

/// Everything the backend returns for one section's consolidated view.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Consolidated {
    #[serde(default)]
    pub students: Vec<ReportStudent>,
    #[serde(default)]
    pub sessions: Vec<ReportSession>,
    #[serde(default)]
    pub competencies: Vec<ReportCompetency>,
    #[serde(default)]
    pub abilities: Vec<ReportAbility>,
    #[serde(default)]
    pub criteria: Vec<ReportCriterion>,
    #[serde(default)]
    pub values: Vec<ReportValue>,
    #[serde(default)]
    pub observations: Vec<ReportObservation>,
}

impl Consolidated {
    fn value_for(&self, student_id: i64, criterion_id: i64) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.student_id == student_id && v.criterion_id == criterion_id)
            .map(|v| v.value.as_str())
    }

    pub fn final_average(&self, student_id: i64) -> Option<LetterGrade> {
        calc::average_letter(
            self.values
                .iter()
                .filter(|v| v.student_id == student_id)
                .map(|v| v.value.as_str()),
        )
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn grade_class(value: &str) -> &'static str {
    value
        .parse::<LetterGrade>()
        .map(LetterGrade::css_class)
        .unwrap_or("")
}

const STYLE: &str = r#"
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.5;
            color: #2d3748;
            background: #f7fafc;
            padding: 12px;
        }
        .container { max-width: 1200px; margin: 0 auto; background: white; border-radius: 16px; overflow: hidden; }
        .header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 24px 16px; text-align: center; }
        .header h1 { font-size: 24px; font-weight: 700; margin-bottom: 8px; }
        .header .subtitle { font-size: 14px; opacity: 0.95; }
        .summary-cards { display: grid; grid-template-columns: repeat(2, 1fr); gap: 12px; padding: 16px; background: #f7fafc; }
        .card { background: white; padding: 16px; border-radius: 12px; text-align: center; }
        .card .number { font-size: 28px; font-weight: 800; color: #667eea; }
        .card .label { font-size: 13px; color: #718096; }
        .students-section { padding: 16px; }
        .student-card { border: 1px solid #e2e8f0; border-radius: 12px; margin-bottom: 16px; overflow: hidden; }
        .student-header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 16px; display: flex; justify-content: space-between; }
        .student-name { font-size: 16px; font-weight: 700; }
        .student-content { padding: 16px; }
        .session-title { font-weight: 700; color: #4a5568; margin: 12px 0 8px; }
        .competency-card { background: #f7fafc; border-radius: 8px; padding: 12px; margin-bottom: 8px; }
        .competency-name { font-weight: 600; margin-bottom: 6px; }
        .ability-name { font-size: 14px; color: #4a5568; }
        .criteria-list { list-style: none; }
        .criterion-item { display: flex; justify-content: space-between; padding: 4px 0; font-size: 13px; }
        .grade { font-weight: 700; min-width: 36px; text-align: center; border-radius: 6px; }
        .grade-ad { background: #e8f5e9; color: #1b5e20; }
        .grade-a { background: #e3f2fd; color: #0d47a1; }
        .grade-b { background: #fff8e1; color: #e65100; }
        .grade-c { background: #ffebee; color: #b71c1c; }
        .final-average { margin-top: 12px; padding: 12px; border-radius: 8px; font-weight: 700; text-align: center; }
        .observations { margin-top: 12px; padding: 12px; border-left: 4px solid #667eea; background: #f7fafc; }
        .observations-title { font-weight: 700; margin-bottom: 6px; }
        .legend { padding: 16px; }
        .legend-items { display: grid; grid-template-columns: repeat(2, 1fr); gap: 8px; }
        .legend-item { display: flex; align-items: center; gap: 8px; font-size: 13px; }
        .legend-color { width: 16px; height: 16px; border-radius: 4px; }
        .footer { text-align: center; padding: 16px; font-size: 12px; color: #718096; }
        @media (min-width: 640px) {
            body { padding: 20px; }
            .summary-cards { grid-template-columns: repeat(4, 1fr); }
            .legend-items { grid-template-columns: repeat(4, 1fr); }
        }
        @media print {
            body { background: white; padding: 0; }
        }
"#;

/// Renders the consolidated view as one self-contained HTML document.
pub fn render_html(data: &Consolidated, section_name: &str, generated_at: DateTime<Local>) -> String {
    let section = escape_html(section_name);
    let mut html = String::new();

    // Writing to a String cannot fail.
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Consolidated {section}</title>
    <style>{STYLE}</style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Consolidated Evaluation Report</h1>
            <div class="subtitle">{section}</div>
        </div>
        <div class="summary-cards">
            <div class="card"><div class="number">{}</div><div class="label">Students</div></div>
            <div class="card"><div class="number">{}</div><div class="label">Sessions</div></div>
            <div class="card"><div class="number">{}</div><div class="label">Competencies</div></div>
            <div class="card"><div class="number">{}</div><div class="label">Criteria</div></div>
        </div>
        <div class="students-section">
"#,
        data.students.len(),
        data.sessions.len(),
        data.competencies.len(),
        data.criteria.len(),
    );

    let mut sessions: Vec<&ReportSession> = data.sessions.iter().collect();
    sessions.sort_by_key(|s| s.number);

    for (index, student) in data.students.iter().enumerate() {
        let _ = write!(
            html,
            r#"            <div class="student-card">
                <div class="student-header">
                    <div class="student-name">{}</div>
                    <div class="student-number">#{}</div>
                </div>
                <div class="student-content">
"#,
            escape_html(&student.full_name),
            index + 1
        );

        for session in &sessions {
            let competencies: Vec<&ReportCompetency> = data
                .competencies
                .iter()
                .filter(|c| c.session_id == session.id)
                .collect();
            if competencies.is_empty() {
                continue;
            }
            let title = session
                .title
                .clone()
                .unwrap_or_else(|| format!("Session {}", session.number));
            let _ = write!(
                html,
                "                    <div class=\"session-group\">\n                        <div class=\"session-title\">{}</div>\n",
                escape_html(&title)
            );

            for competency in competencies {
                let _ = write!(
                    html,
                    "                        <div class=\"competency-card\">\n                            <div class=\"competency-name\">{}</div>\n",
                    escape_html(&competency.display_name)
                );
                for ability in data.abilities.iter().filter(|a| a.competency_id == competency.id) {
                    let _ = write!(
                        html,
                        "                            <div class=\"ability-item\">\n                                <div class=\"ability-name\">{}</div>\n                                <ul class=\"criteria-list\">\n",
                        escape_html(&ability.display_name)
                    );
                    for criterion in data.criteria.iter().filter(|c| c.ability_id == ability.id) {
                        let value = data.value_for(student.id, criterion.id).unwrap_or("-");
                        let _ = writeln!(
                            html,
                            "                                    <li class=\"criterion-item\"><span class=\"criterion-name\">{}</span><span class=\"grade {}\">{}</span></li>",
                            escape_html(&criterion.display_name),
                            grade_class(value),
                            escape_html(value)
                        );
                    }
                    html.push_str("                                </ul>\n                            </div>\n");
                }
                html.push_str("                        </div>\n");
            }
            html.push_str("                    </div>\n");
        }

        let average = data.final_average(student.id);
        let _ = writeln!(
            html,
            "                    <div class=\"final-average {}\">Final average: {}</div>",
            average.map(LetterGrade::css_class).unwrap_or(""),
            average.map(LetterGrade::as_str).unwrap_or("-")
        );

        let observations: Vec<&ReportObservation> = data
            .observations
            .iter()
            .filter(|o| o.student_id == student.id)
            .collect();
        if !observations.is_empty() {
            html.push_str("                    <div class=\"observations\">\n                        <div class=\"observations-title\">Observations</div>\n");
            for obs in observations {
                let ability = data
                    .abilities
                    .iter()
                    .find(|a| a.id == obs.ability_id)
                    .map(|a| a.display_name.as_str())
                    .unwrap_or("");
                let _ = writeln!(
                    html,
                    "                        <div class=\"observation-item\"><strong>{}:</strong> {}</div>",
                    escape_html(ability),
                    escape_html(&obs.observation)
                );
            }
            html.push_str("                    </div>\n");
        }

        html.push_str("                </div>\n            </div>\n");
    }

    html.push_str(
        "            <div class=\"legend\">\n                <div class=\"legend-title\">Grade legend</div>\n                <div class=\"legend-items\">\n",
    );
    for grade in [LetterGrade::AD, LetterGrade::A, LetterGrade::B, LetterGrade::C] {
        let _ = writeln!(
            html,
            "                    <div class=\"legend-item\"><div class=\"legend-color {}\"></div><span>{} - {}</span></div>",
            grade.css_class(),
            grade.as_str(),
            grade.description()
        );
    }
    let _ = write!(
        html,
        r#"                </div>
            </div>
        </div>
        <div class="footer">
            Generated on {}<br>
            <small>Classter evaluation system</small>
        </div>
    </div>
</body>
</html>
"#,
        generated_at.format("%d/%m/%Y %H:%M")
    );

    html
}

/// `consolidado_<section>_<stamp>.html`. Anything in the section name other
/// than alphanumerics, `-` and `_` becomes `_`, so the name stays one path
/// component under `reports/`.
pub fn report_file_name(section_name: &str, generated_at: DateTime<Local>) -> String {
    let section: String = section_name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!(
        "consolidado_{}_{}.html",
        section,
        generated_at.format("%Y-%m-%d_%H-%M")
    )
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub file_name: String,
    pub bytes: usize,
}

pub fn export_html(
    workspace: &Path,
    data: &Consolidated,
    section_name: &str,
    generated_at: DateTime<Local>,
) -> anyhow::Result<ExportSummary> {
    let dir = workspace.join(REPORTS_DIR);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory {}", dir.to_string_lossy()))?;

    let file_name = report_file_name(section_name, generated_at);
    let path = dir.join(&file_name);
    let html = render_html(data, section_name, generated_at);
    std::fs::write(&path, html.as_bytes())
        .with_context(|| format!("failed to write report {}", path.to_string_lossy()))?;
    info!(path = %path.to_string_lossy(), bytes = html.len(), "report exported");

    Ok(ExportSummary {
        path,
        file_name,
        bytes: html.len(),
    })
}

/// Payload encoded in the share QR code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareData {
    pub section_id: i64,
    pub file_name: String,
    pub file_uri: String,
    pub timestamp: i64,
    pub expires_at: i64,
    pub section_name: String,
}

impl ShareData {
    pub fn new(section_id: i64, section_name: &str, export: &ExportSummary, now: i64) -> Self {
        Self {
            section_id,
            file_name: export.file_name.clone(),
            file_uri: format!("file://{}", export.path.to_string_lossy()),
            timestamp: now,
            expires_at: now + SHARE_TTL_MS,
            section_name: section_name.to_string(),
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}
