//! CLI presentation: text and json formatters for bundles, plan, and apply.

use crate::context::{AppliedEffect, Context};
use crate::directive::Directive;
use crate::error::ApiError;
use crate::executor::ExecutionReport;
use crate::resolver::Resolution;
use comfy_table::Table;
use serde::Serialize;
use serde_json::json;

/// One provider row for `bundles`.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSummary {
    pub name: String,
    pub bundles: Vec<String>,
}

pub fn format_bundles_text(providers: &[ProviderSummary]) -> String {
    if providers.is_empty() {
        return "No providers defined.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Provider", "Bundles"]);
    for provider in providers {
        let bundles = if provider.bundles.is_empty() {
            "-".to_string()
        } else {
            provider.bundles.join(", ")
        };
        table.add_row(vec![provider.name.clone(), bundles]);
    }
    table.to_string()
}

pub fn format_bundles_json(providers: &[ProviderSummary]) -> Result<String, ApiError> {
    let out = json!({ "providers": providers, "total": providers.len() });
    Ok(serde_json::to_string_pretty(&out)?)
}

pub fn format_plan_text(resolution: &Resolution) -> String {
    if resolution.is_empty() {
        return format!("Provider {}: nothing to do.", resolution.provider());
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["#", "Position", "Action", "Target", "Args"]);
    for (index, directive) in resolution.directives().iter().enumerate() {
        let (action, target, args) = describe(directive);
        table.add_row(vec![
            (index + 1).to_string(),
            directive.position().to_string(),
            action,
            target,
            args,
        ]);
    }
    format!(
        "Provider: {}\nDirectives: {}\n{}",
        resolution.provider(),
        resolution.len(),
        table
    )
}

pub fn format_plan_json(resolution: &Resolution) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(&resolution.to_json())?)
}

pub fn format_apply_text(report: &ExecutionReport, context: &Context) -> String {
    let mut output = format!(
        "Context: {} (batch {})\nApplied: {}  Verified: {}  Expanded: {}\n",
        context.name(),
        report.batch,
        report.applied,
        report.verified,
        report.expanded
    );
    if context.journal().is_empty() {
        output.push_str("No effects recorded.");
        return output;
    }
    output.push_str(&format_journal_table(context.journal()));
    output
}

pub fn format_journal_table(journal: &[AppliedEffect]) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["#", "Action", "Target", "Args"]);
    for (index, effect) in journal.iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            effect.kind.to_string(),
            effect.target.clone(),
            effect.args.join(", "),
        ]);
    }
    table.to_string()
}

pub fn format_apply_json(report: &ExecutionReport, context: &Context) -> Result<String, ApiError> {
    let out = json!({
        "context": context.name(),
        "report": report,
        "journal": context.journal(),
        "attributes": context.attributes(),
    });
    Ok(serde_json::to_string_pretty(&out)?)
}

fn describe(directive: &Directive) -> (String, String, String) {
    if let Some(generator) = directive.generator_ref() {
        return ("generate".to_string(), generator.label().to_string(), String::new());
    }
    let action = directive
        .action_kind()
        .map(|kind| kind.to_string())
        .unwrap_or_default();
    let target = directive.target().unwrap_or_default().to_string();
    let args = match directive.min_version() {
        Some(version) => format!(">= {}", version),
        None => directive.args().join(", "),
    };
    (action, target, args)
}
