//! Page and result-card rendering
//!
//! Templates are compiled once into a `minijinja` environment. The page
//! template is registered under an `.html` name so every interpolated value is
//! HTML-escaped; the plain-text card used by the CLI is not.

use minijinja::{context, Environment};
use serde::Serialize;

use crate::{
    error::{LabDelayError, Result},
    form::{
        field_specs, ExperienceLevel, ExperimentType, FieldKind, FormInput, InstrumentType,
        PriorityLevel, ReagentBatch, Section, DAYS_SINCE_START, EXPECTED_DURATION_FIELD,
        HOUR_OF_DAY, LAB_OCCUPANCY, MEAN_AMBIENT_TEMP, SCIENTIST_WORKLOAD,
    },
    predictor::Prediction,
    record::{FeatureRecord, SchemaVersion},
    risk::RiskAssessment,
    VERSION,
};

/// Browser title
pub const PAGE_TITLE: &str = "Lab Operations - Delay Predictor";

/// Heading shown above the form
pub const PAGE_HEADING: &str = "🔬 Lab Operations - Delay Prediction System";

/// Instrument age (days) the insight panel flags
pub const AGING_INSIGHT_DAYS: u32 = 600;

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{ title }}</title>
<style>
body { font-family: sans-serif; margin: 0; display: flex; }
aside { width: 320px; padding: 16px; background: #f0f2f6; min-height: 100vh; }
main { flex: 1; padding: 24px; }
.columns { display: flex; gap: 24px; }
.wide { flex: 2; }
.narrow { flex: 1; }
label { display: block; margin-top: 12px; font-weight: bold; }
small { display: block; color: #555; }
table { border-collapse: collapse; }
td, th { border: 1px solid #ddd; padding: 4px 8px; }
.card { background-color: #f0f2f6; padding: 20px; border-radius: 10px; }
.error { background: #fde8e8; color: #9b1c1c; padding: 12px; border-radius: 6px; }
.insight { background: #e8f0fd; padding: 12px; border-radius: 6px; }
</style>
</head>
<body>
<form id="labdelay-form" method="post" action="/predict" style="display: flex; width: 100%;">
<aside>
{% for section in sidebar %}
<h2>{{ section.title }}</h2>
{% for field in section.fields %}{{ widget(field) }}{% endfor %}
<hr>
{% endfor %}
</aside>
<main>
<h1>{{ heading }}</h1>
<h3>Advanced AI-Driven Operations Management</h3>
<hr>
<div class="columns">
<div class="wide">
<details>
<summary>{{ advanced.title }}</summary>
{% for field in advanced.fields %}{{ widget(field) }}{% endfor %}
</details>
<h2>Experimental Overview</h2>
<p><small>Feature schema {{ schema }}</small></p>
<table>
<tr>{% for cell in overview %}<th>{{ cell[0] }}</th>{% endfor %}</tr>
<tr>{% for cell in overview %}<td>{{ cell[1] }}</td>{% endfor %}</tr>
</table>
<p><button type="submit">Predict Delay Risk</button></p>
{% if card %}
<h3>Prediction Result</h3>
<div class="card" style="border-left: 10px solid {{ card.color }};">
<h2 style="color: {{ card.color }}; margin:0;">{{ card.label }}</h2>
<h3 style="margin:0;">{{ card.delay_text }}</h3>
<p style="margin-top: 10px;"><strong>Action:</strong> {{ card.advice }}</p>
</div>
{% endif %}
{% if error %}<div class="error">{{ error }}</div>{% endif %}
</div>
<div class="narrow">
<h3>Manager's Insight</h3>
<div class="insight">
<strong>Delay Drivers Identified:</strong>
<ol>
<li><strong>Stress Index</strong>: High Workload * High Occupancy = <strong>Exponential Risk</strong>. Current index: {{ insight.stress_index }}.</li>
<li><strong>Machine Aging (Drift)</strong>: Instruments older than <strong>{{ insight.aging_days }} days</strong> show degradation.{% if insight.aged %} This instrument is past that point.{% endif %}</li>
<li><strong>Supply Chain</strong>: <strong>{{ insight.bad_batch }}</strong> is a known defective batch.{% if insight.bad_batch_selected %} It is selected.{% endif %}</li>
</ol>
</div>
<hr>
<p><small>{{ caption }}</small></p>
</div>
</div>
</main>
</form>
</body>
</html>
"#;

const WIDGET_MACRO: &str = r#"{% macro widget(field) %}
<label for="{{ field.name }}">{{ field.label }}{% if field.kind == "slider" %}: <output>{{ field.value }}</output>{% endif %}</label>
{% if field.kind == "select" %}<select id="{{ field.name }}" name="{{ field.name }}">
{% for option in field.options %}<option value="{{ option }}"{% if option == field.value %} selected{% endif %}>{{ option }}</option>
{% endfor %}</select>
{% elif field.kind == "slider" %}<input type="range" id="{{ field.name }}" name="{{ field.name }}" min="{{ field.min }}" max="{{ field.max }}" step="{{ field.step }}" value="{{ field.value }}" oninput="this.previousElementSibling.lastElementChild.value = this.value">
{% else %}<input type="number" id="{{ field.name }}" name="{{ field.name }}" min="{{ field.min }}" step="any" value="{{ field.value }}" placeholder="{{ field.placeholder }}">
{% endif %}{% if field.help %}<small>{{ field.help }}</small>{% endif %}
{% endmacro %}"#;

const CARD_TEMPLATE: &str = "{{ card.label }}
{{ card.delay_text }}
Action: {{ card.advice }}
Schema: {{ schema }} | Model: {{ model }}
";

#[derive(Debug, Serialize)]
struct FieldView {
    name: &'static str,
    label: &'static str,
    help: &'static str,
    kind: &'static str,
    min: String,
    max: String,
    step: String,
    value: String,
    placeholder: String,
    options: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SectionView {
    title: &'static str,
    fields: Vec<FieldView>,
}

#[derive(Debug, Serialize)]
struct CardView {
    label: &'static str,
    color: &'static str,
    delay_text: String,
    advice: &'static str,
}

impl From<&RiskAssessment> for CardView {
    fn from(a: &RiskAssessment) -> Self {
        Self {
            label: a.label,
            color: a.color,
            delay_text: a.delay_text(),
            advice: a.advice,
        }
    }
}

#[derive(Debug, Serialize)]
struct InsightView {
    stress_index: String,
    aging_days: u32,
    aged: bool,
    bad_batch: &'static str,
    bad_batch_selected: bool,
}

/// What the result area of the page shows
#[derive(Debug, Clone, Copy)]
pub enum Panel<'a> {
    /// Nothing submitted yet
    Empty,
    /// Result card for a successful prediction
    Prediction(&'a Prediction),
    /// Error message (model missing, prediction failure, invalid input)
    Error(&'a str),
}

/// Current value of every widget, as the form should show it
fn widget_value(input: &FormInput, name: &str) -> String {
    match name {
        n if n == LAB_OCCUPANCY.field => input.lab_occupancy().to_string(),
        n if n == SCIENTIST_WORKLOAD.field => input.scientist_workload().to_string(),
        n if n == HOUR_OF_DAY.field => input.hour_of_day().to_string(),
        n if n == DAYS_SINCE_START.field => input.days_since_start().to_string(),
        n if n == MEAN_AMBIENT_TEMP.field => input.mean_ambient_temp().to_string(),
        n if n == ReagentBatch::FIELD => input.reagent_batch_id().to_string(),
        n if n == ExperimentType::FIELD => input.experiment_type().to_string(),
        n if n == InstrumentType::FIELD => input.instrument_type().to_string(),
        n if n == ExperienceLevel::FIELD => input.scientist_experience().to_string(),
        n if n == PriorityLevel::FIELD => input.priority_level().to_string(),
        // blank keeps the duration tied to the experiment type
        n if n == EXPECTED_DURATION_FIELD && input.duration_overridden() => {
            input.expected_duration().to_string()
        },
        _ => String::new(),
    }
}

fn sections(input: &FormInput) -> Vec<(Section, SectionView)> {
    let mut out: Vec<(Section, SectionView)> = Vec::new();
    for spec in field_specs() {
        let value = widget_value(input, spec.name);
        let field = match spec.kind {
            FieldKind::Slider { min, max, step, .. } => FieldView {
                name: spec.name,
                label: spec.label,
                help: spec.help,
                kind: "slider",
                min: min.to_string(),
                max: max.to_string(),
                step: step.to_string(),
                value,
                placeholder: String::new(),
                options: Vec::new(),
            },
            FieldKind::Number { min, .. } => FieldView {
                name: spec.name,
                label: spec.label,
                help: spec.help,
                kind: "number",
                min: min.to_string(),
                max: String::new(),
                step: String::new(),
                value,
                placeholder: input.experiment_type().default_duration().to_string(),
                options: Vec::new(),
            },
            FieldKind::Select { options, .. } => FieldView {
                name: spec.name,
                label: spec.label,
                help: spec.help,
                kind: "select",
                min: String::new(),
                max: String::new(),
                step: String::new(),
                value,
                placeholder: String::new(),
                options,
            },
        };
        match out.last_mut() {
            Some((section, view)) if *section == spec.section => view.fields.push(field),
            _ => out.push((
                spec.section,
                SectionView {
                    title: spec.section.title(),
                    fields: vec![field],
                },
            )),
        }
    }
    out
}

/// Compiled page templates
#[derive(Debug)]
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    /// Compile all templates
    ///
    /// # Errors
    ///
    /// Returns `LabDelayError::Render` if a template does not parse.
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template_owned("page.html", format!("{WIDGET_MACRO}{PAGE_TEMPLATE}"))
            .map_err(|e| LabDelayError::Render {
                reason: format!("Invalid template syntax: {e}"),
            })?;
        env.add_template("card.txt", CARD_TEMPLATE)
            .map_err(|e| LabDelayError::Render {
                reason: format!("Invalid template syntax: {e}"),
            })?;
        Ok(Self { env })
    }

    /// Render the full page for the current widget values
    ///
    /// `display_schema` selects the columns of the overview table; a
    /// prediction panel overrides it with the schema the model consumed.
    ///
    /// # Errors
    ///
    /// Returns `LabDelayError::Render` on template failures.
    pub fn render_page(
        &self,
        input: &FormInput,
        display_schema: SchemaVersion,
        panel: Panel<'_>,
    ) -> Result<String> {
        let tmpl = self
            .env
            .get_template("page.html")
            .map_err(|e| LabDelayError::Render {
                reason: format!("Template error: {e}"),
            })?;

        let (record, card, error) = match panel {
            Panel::Empty => (FeatureRecord::from_input(input, display_schema), None, None),
            Panel::Prediction(p) => (
                p.record.clone(),
                Some(CardView::from(&RiskAssessment::new(p.delay_minutes))),
                None,
            ),
            Panel::Error(message) => (
                FeatureRecord::from_input(input, display_schema),
                None,
                Some(message),
            ),
        };
        let overview: Vec<(&str, String)> = record
            .columns()
            .into_iter()
            .map(|(name, value)| (name, value.to_string()))
            .collect();

        let mut sidebar = Vec::new();
        let mut advanced = None;
        for (section, view) in sections(input) {
            if section == Section::Advanced {
                advanced = Some(view);
            } else {
                sidebar.push(view);
            }
        }

        let insight = InsightView {
            stress_index: input.stress_index().to_string(),
            aging_days: AGING_INSIGHT_DAYS,
            aged: input.days_since_start() > AGING_INSIGHT_DAYS,
            bad_batch: crate::form::BAD_BATCH,
            bad_batch_selected: input.reagent_batch_id().is_known_bad(),
        };

        tmpl.render(context!(
            title => PAGE_TITLE,
            heading => PAGE_HEADING,
            sidebar => sidebar,
            advanced => advanced,
            schema => record.version().to_string(),
            overview => overview,
            card => card,
            error => error,
            insight => insight,
            caption => caption(),
        ))
        .map_err(|e| LabDelayError::Render {
            reason: format!("Render error: {e}"),
        })
    }

    /// Plain-text result card
    ///
    /// # Errors
    ///
    /// Returns `LabDelayError::Render` on template failures.
    pub fn render_card(&self, prediction: &Prediction) -> Result<String> {
        let tmpl = self
            .env
            .get_template("card.txt")
            .map_err(|e| LabDelayError::Render {
                reason: format!("Template error: {e}"),
            })?;
        tmpl.render(context!(
            card => CardView::from(&RiskAssessment::new(prediction.delay_minutes)),
            schema => prediction.schema.to_string(),
            model => prediction.model_name.as_str(),
        ))
        .map_err(|e| LabDelayError::Render {
            reason: format!("Render error: {e}"),
        })
    }
}

/// Version line at the bottom of the page
#[must_use]
pub fn caption() -> String {
    format!("v{VERSION} | Lab Delay Predictor")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        form::{FormSubmission, RawValue},
        risk::RiskTier,
    };

    fn prediction(delay: f64) -> Prediction {
        let input = FormInput::default();
        Prediction {
            delay_minutes: delay,
            tier: RiskTier::classify(delay),
            schema: SchemaVersion::V2,
            record: FeatureRecord::from_input(&input, SchemaVersion::V2),
            model_name: "test".to_string(),
        }
    }

    #[test]
    fn test_empty_page_has_sections_and_overview() {
        let renderer = Renderer::new().unwrap();
        let html = renderer
            .render_page(&FormInput::default(), SchemaVersion::V2, Panel::Empty)
            .unwrap();
        assert!(html.contains("Operational Parameters"));
        assert!(html.contains("Simulation &amp; Supply Chain (V2)"));
        assert!(html.contains("Experiment Details"));
        assert!(html.contains("Advanced Configuration (Hidden Variables)"));
        assert!(html.contains("Experimental Overview"));
        assert!(html.contains("<th>stress_index</th>"));
        assert!(html.contains("<td>350</td>"));
        assert!(html.contains("Manager's Insight"));
        assert!(html.contains(&caption()));
        assert!(!html.contains("Expected Delay"));
    }

    #[test]
    fn test_page_title_heading_and_caption() {
        let renderer = Renderer::new().unwrap();
        let html = renderer
            .render_page(&FormInput::default(), SchemaVersion::V2, Panel::Empty)
            .unwrap();
        assert!(html.contains("<title>Lab Operations - Delay Predictor</title>"));
        assert!(html.contains(PAGE_HEADING));
        assert_eq!(caption(), format!("v{} | Lab Delay Predictor", crate::VERSION));
        assert!(!html.contains("Roche"));
    }

    #[test]
    fn test_v1_overview_columns() {
        let renderer = Renderer::new().unwrap();
        let html = renderer
            .render_page(&FormInput::default(), SchemaVersion::V1, Panel::Empty)
            .unwrap();
        assert!(html.contains("<th>mean_ambient_temp</th>"));
        assert!(!html.contains("<th>stress_index</th>"));
    }

    #[test]
    fn test_result_card() {
        let renderer = Renderer::new().unwrap();
        let p = prediction(10.0);
        let html = renderer
            .render_page(&FormInput::default(), SchemaVersion::V2, Panel::Prediction(&p))
            .unwrap();
        assert!(html.contains("LOW RISK"));
        assert!(html.contains("Expected Delay: 10.0 minutes"));
        assert!(html.contains("border-left: 10px solid green"));
        assert!(html.contains("Process is standard. No intervention needed."));
    }

    #[test]
    fn test_error_panel_is_escaped() {
        let renderer = Renderer::new().unwrap();
        let html = renderer
            .render_page(
                &FormInput::default(),
                SchemaVersion::V2,
                Panel::Error("Prediction Error: <script>alert(1)</script>"),
            )
            .unwrap();
        assert!(html.contains("Prediction Error: &lt;script&gt;"));
        assert!(!html.contains("<script>alert(1)</script>"));
    }

    #[test]
    fn test_widgets_reflect_input() {
        let input = FormInput::from_submission(&FormSubmission {
            lab_occupancy: Some(RawValue::Number(85.0)),
            reagent_batch_id: Some(RawValue::Text("BATCH_392".to_string())),
            days_since_start: Some(RawValue::Number(650.0)),
            ..FormSubmission::default()
        })
        .unwrap();
        let html = Renderer::new()
            .unwrap()
            .render_page(&input, SchemaVersion::V2, Panel::Empty)
            .unwrap();
        assert!(html.contains(r#"value="85""#));
        assert!(html.contains(r#"<option value="BATCH_392" selected>"#));
        assert!(html.contains("It is selected."));
        assert!(html.contains("This instrument is past that point."));
    }

    #[test]
    fn test_duration_blank_unless_overridden() {
        assert_eq!(widget_value(&FormInput::default(), EXPECTED_DURATION_FIELD), "");
        let input = FormInput::from_submission(&FormSubmission {
            expected_duration: Some(RawValue::Text("75".to_string())),
            ..FormSubmission::default()
        })
        .unwrap();
        assert_eq!(widget_value(&input, EXPECTED_DURATION_FIELD), "75");
    }

    #[test]
    fn test_text_card() {
        let card = Renderer::new().unwrap().render_card(&prediction(45.0)).unwrap();
        assert!(card.starts_with("HIGH RISK (BOTTLENECK)\nExpected Delay: 45.0 minutes\n"));
        assert!(card.contains("Action: CRITICAL"));
    }
}
