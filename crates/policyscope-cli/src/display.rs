//! Vertical card display for analysis results.
//!
//! Every outcome renders as a titled card with labelled sections. Optional
//! fields fall back to a fixed "no data" text instead of being skipped, so a
//! sparse backend response still shows every section.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use policyscope_core::report::{PolicyDigest, PolicySides};
use policyscope_core::{
    AnalysisOutcome, AnalysisReport, Comparison, ComparisonReport, DocumentResponse, Entity,
    EntityReport, RecommendationResponse, Statistics, SummaryReport,
};
use serde_json::Value;

const NOT_AVAILABLE: &str = "N/A";
const NO_TOKENS: &str = "None";
const NO_ENTITIES: &str = "No entities found";
const NO_RECOMMENDATIONS: &str = "No recommendations available";
const NO_SUMMARY: &str = "No summary available";

/// Characters of policy content shown before eliding.
const PREVIEW_CHARS: usize = 60;
/// Document keywords shown on an upload card.
const MAX_KEYWORDS: usize = 10;

// ── Public API ──

/// Write the card for a normalised outcome.
pub fn print_outcome(out: &mut impl Write, outcome: &AnalysisOutcome) -> io::Result<()> {
    match outcome {
        AnalysisOutcome::Analysis(report) => print_analysis(out, report),
        AnalysisOutcome::Summary(report) => print_summary(out, report),
        AnalysisOutcome::Entities(report) => print_entities(out, report),
        AnalysisOutcome::Comparison(report) => print_comparison(out, report),
        AnalysisOutcome::Recommendation(report) => print_recommendation(out, report),
        AnalysisOutcome::Upload(response) => print_upload(out, response),
        AnalysisOutcome::Batch(responses) => print_batch(out, responses),
    }
}

/// Whole-number percentage: `0.5` renders as `50%`.
pub fn percent(score: f64) -> String {
    format!("{}%", (score * 100.0).round() as i64)
}

// ── Cards ──

fn print_comparison(out: &mut impl Write, report: &ComparisonReport) -> io::Result<()> {
    writeln!(out, "=== Policy Comparison ===")?;
    writeln!(out)?;
    write_comparison(out, &report.comparison)
}

fn print_analysis(out: &mut impl Write, report: &AnalysisReport) -> io::Result<()> {
    writeln!(out, "=== {} ===", report.document_name)?;
    if let Some(status) = &report.status {
        writeln!(out, "{status}")?;
    }
    writeln!(out)?;

    write_statistics(out, report.statistics.as_ref())?;

    if let Some(comparison) = &report.comparison {
        write_comparison(out, comparison)?;
    }

    if let Some(policies) = &report.policies {
        write_policies(out, policies)?;
    }

    writeln!(out, "Entities")?;
    write_entity_lines(out, report.entities.as_deref().unwrap_or_default())?;
    writeln!(out)?;

    writeln!(out, "Recommendations")?;
    match &report.recommendations {
        Some(value) if !is_empty_json(value) => {
            match serde_json::from_value::<RecommendationResponse>(value.clone()) {
                Ok(weather) => write_weather(out, &weather)?,
                Err(_) => {
                    write_json_block(out, value)?;
                    writeln!(out)?;
                }
            }
        }
        _ => {
            writeln!(out, "  {NO_RECOMMENDATIONS}")?;
            writeln!(out)?;
        }
    }

    if let Some(analysis) = report.analysis.as_ref().filter(|v| !is_empty_json(v)) {
        writeln!(out, "Analysis")?;
        write_json_block(out, analysis)?;
        writeln!(out)?;
    }
    Ok(())
}

fn print_summary(out: &mut impl Write, report: &SummaryReport) -> io::Result<()> {
    writeln!(out, "=== Summary ===")?;
    if let Some(name) = &report.filename {
        writeln!(out, "{name}")?;
    }
    writeln!(out)?;
    let text = report.summary.trim();
    writeln!(out, "  {}", if text.is_empty() { NO_SUMMARY } else { text })?;
    writeln!(out)
}

fn print_entities(out: &mut impl Write, report: &EntityReport) -> io::Result<()> {
    writeln!(out, "=== Named Entities ===")?;
    if let Some(name) = &report.filename {
        writeln!(out, "{name}")?;
    }
    writeln!(out)?;
    writeln!(out, "Entities ({})", report.entities.len())?;
    write_entity_lines(out, &report.entities)?;
    writeln!(out)
}

fn print_recommendation(out: &mut impl Write, report: &RecommendationResponse) -> io::Result<()> {
    writeln!(out, "=== Weather Recommendation ===")?;
    writeln!(out)?;
    write_weather(out, report)
}

fn print_upload(out: &mut impl Write, response: &DocumentResponse) -> io::Result<()> {
    writeln!(out, "=== Document Upload ===")?;
    writeln!(out, "{}", upload_line(response))?;
    writeln!(out)?;

    let Some(doc) = &response.document else {
        return Ok(());
    };

    writeln!(out, "Identity")?;
    writeln!(out, "  {:<26} {}", "id", doc.id)?;
    writeln!(out, "  {:<26} {}", "file_name", doc.file_name)?;
    writeln!(out, "  {:<26} {}", "file_type", doc.file_type)?;
    writeln!(out, "  {:<26} {} bytes", "file_size", doc.file_size)?;
    writeln!(out, "  {:<26} {}", "language", or_na(doc.language.as_deref()))?;
    writeln!(out, "  {:<26} {}", "processing_date", format_date(doc.processing_date))?;
    writeln!(out, "  {:<26} {}", "sections", doc.sections.len())?;
    writeln!(out)?;

    let meta = &doc.metadata;
    writeln!(out, "Metadata")?;
    writeln!(out, "  {:<26} {}", "title", or_na(meta.title.as_deref()))?;
    writeln!(out, "  {:<26} {}", "author", or_na(meta.author.as_deref()))?;
    writeln!(out, "  {:<26} {}", "subject", or_na(meta.subject.as_deref()))?;
    writeln!(
        out,
        "  {:<26} {}",
        "page_count",
        meta.page_count.map_or_else(|| NOT_AVAILABLE.to_string(), |n| n.to_string())
    )?;
    writeln!(out, "  {:<26} {}", "creation_date", format_date(meta.creation_date))?;
    writeln!(out, "  {:<26} {}", "modification_date", format_date(meta.modification_date))?;
    writeln!(out)?;

    writeln!(out, "Keywords ({})", doc.keywords.len())?;
    if doc.keywords.is_empty() {
        writeln!(out, "  {NO_TOKENS}")?;
    }
    for keyword in doc.keywords.iter().take(MAX_KEYWORDS) {
        writeln!(out, "  {keyword}")?;
    }
    if doc.keywords.len() > MAX_KEYWORDS {
        writeln!(out, "  ... and {} more", doc.keywords.len() - MAX_KEYWORDS)?;
    }
    writeln!(out)
}

fn print_batch(out: &mut impl Write, responses: &[DocumentResponse]) -> io::Result<()> {
    let ok = responses.iter().filter(|r| r.success).count();
    writeln!(out, "=== Batch Upload ===")?;
    writeln!(out, "{ok} of {} documents processed", responses.len())?;
    writeln!(out)?;
    for response in responses {
        writeln!(out, "  {}", upload_line(response))?;
    }
    writeln!(out)
}

// ── Sections ──

fn write_comparison(out: &mut impl Write, comparison: &Comparison) -> io::Result<()> {
    writeln!(out, "Comparison")?;
    writeln!(out, "  {:<26} {}", "similarity", percent(comparison.similarity_score))?;
    writeln!(out)?;
    let details = &comparison.details;
    write_token_list(out, "Overlap", &details.overlap)?;
    write_token_list(out, "Unique to Policy 1", &details.unique_policy1)?;
    write_token_list(out, "Unique to Policy 2", &details.unique_policy2)
}

fn write_weather(out: &mut impl Write, report: &RecommendationResponse) -> io::Result<()> {
    writeln!(out, "  {:<26} {}", "predicted_condition", report.predicted_condition)?;
    writeln!(out, "  {:<26} {:.1}%", "confidence", report.confidence * 100.0)?;
    if let Some(message) = &report.message {
        writeln!(out, "  {:<26} {}", "message", message)?;
    }
    writeln!(out)?;

    writeln!(out, "Similar Days ({})", report.top_similar_days.len())?;
    if report.top_similar_days.is_empty() {
        writeln!(out, "  {NO_TOKENS}")?;
        return writeln!(out);
    }
    writeln!(
        out,
        "  {:<20} {:>5} {:>8} {:>9} {:>9}  {:<12} {:>10}",
        "location", "month", "temp °C", "humidity", "wind km/h", "condition", "similarity"
    )?;
    for day in &report.top_similar_days {
        writeln!(
            out,
            "  {:<20} {:>5} {:>8.1} {:>8}% {:>9.1}  {:<12} {:>10}",
            day.location,
            day.month,
            day.temperature_c,
            day.humidity_pct,
            day.wind_kmh,
            day.condition,
            percent(day.similarity),
        )?;
    }
    writeln!(out)
}

fn write_token_list(out: &mut impl Write, header: &str, tokens: &[String]) -> io::Result<()> {
    writeln!(out, "{header} ({})", tokens.len())?;
    if tokens.is_empty() {
        writeln!(out, "  {NO_TOKENS}")?;
    }
    for token in tokens {
        writeln!(out, "  {token}")?;
    }
    writeln!(out)
}

fn write_statistics(out: &mut impl Write, stats: Option<&Statistics>) -> io::Result<()> {
    let stats = stats.cloned().unwrap_or_default();
    writeln!(out, "Statistics")?;
    writeln!(out, "  {:<26} {}", "word_count", or_na(stats.word_count))?;
    writeln!(out, "  {:<26} {}", "sentence_count", or_na(stats.sentence_count))?;
    writeln!(
        out,
        "  {:<26} {}",
        "average_words_per_sentence",
        stats
            .average_words_per_sentence
            .map_or_else(|| NOT_AVAILABLE.to_string(), |n| format!("{n:.1}"))
    )?;
    writeln!(out)
}

fn write_policies(out: &mut impl Write, policies: &PolicySides) -> io::Result<()> {
    for (header, digest) in [("Policy 1", &policies.policy1), ("Policy 2", &policies.policy2)] {
        let digest = digest.clone().unwrap_or_default();
        writeln!(out, "{header}")?;
        write_digest(out, &digest)?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_digest(out: &mut impl Write, digest: &PolicyDigest) -> io::Result<()> {
    if let Some(content) = digest.content.as_deref().filter(|c| !c.trim().is_empty()) {
        writeln!(out, "  {:<26} {}", "content", preview(content))?;
    }
    let summary = digest
        .summary
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_SUMMARY);
    writeln!(out, "  {:<26} {}", "summary", summary)?;
    let keywords = if digest.keywords.is_empty() {
        NO_TOKENS.to_string()
    } else {
        digest.keywords.join(", ")
    };
    writeln!(out, "  {:<26} {}", "keywords", keywords)
}

fn write_entity_lines(out: &mut impl Write, entities: &[Entity]) -> io::Result<()> {
    if entities.is_empty() {
        return writeln!(out, "  {NO_ENTITIES}");
    }
    for entity in entities {
        writeln!(out, "  {}: {}", entity.label, entity.text)?;
    }
    Ok(())
}

fn write_json_block(out: &mut impl Write, value: &Value) -> io::Result<()> {
    let pretty = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    for line in pretty.lines() {
        writeln!(out, "  {line}")?;
    }
    Ok(())
}

// ── Helpers ──

fn upload_line(response: &DocumentResponse) -> String {
    let name = response
        .document
        .as_ref()
        .map(|d| format!("{}: ", d.file_name))
        .unwrap_or_default();
    match (response.success, &response.error) {
        (true, _) => format!("[ok] {name}{}", response.message),
        (false, Some(error)) => format!("[failed] {name}{}: {error}", response.message),
        (false, None) => format!("[failed] {name}{}", response.message),
    }
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map_or_else(
        || NOT_AVAILABLE.to_string(),
        |d| d.format("%Y-%m-%d %H:%M UTC").to_string(),
    )
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > PREVIEW_CHARS {
        let head: String = flat.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{head}...")
    } else {
        flat
    }
}

fn is_empty_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
