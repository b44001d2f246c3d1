//! Fixed-width self-description of an analysis (what `Display for Eva` prints).

use crate::eva::Eva;

const WIDTH: usize = 100;
/// Gap between the two columns of a paired line.
const SEP: usize = 6;

/// Render the analysis state: data, extremes, model.
pub fn describe(eva: &Eva) -> String {
    let mut lines = vec![
        center("Extreme Value Analysis"),
        "=".repeat(WIDTH),
        center("Original Data"),
        "-".repeat(WIDTH),
    ];

    let signal = eva.signal();
    let range = format!(
        "{} to {}",
        signal.first_timestamp().format("%B %Y"),
        signal.last_timestamp().format("%B %Y")
    );
    lines.push(pair(("Data label", "Data range"), (signal.name(), &range)));
    lines.push("=".repeat(WIDTH));

    lines.push(center("Extreme Values"));
    lines.push("-".repeat(WIDTH));
    match eva.extremes() {
        None => lines.push("Extreme values have not been extracted".to_string()),
        Some(extremes) => {
            let (parameter, value) = extremes.parameters().headline();
            lines.push(pair(
                ("Number of extreme events", "Extraction method"),
                (&extremes.len().to_string(), extremes.method().label()),
            ));
            lines.push(pair(
                ("Type of extreme events", parameter),
                (&extremes.extremes_type().to_string(), &value),
            ));
        }
    }
    lines.push("=".repeat(WIDTH));

    lines.push(center("Model"));
    lines.push("-".repeat(WIDTH));
    match eva.model() {
        None => lines.push("Model has not been fit to the extremes".to_string()),
        Some(model) => {
            lines.push(pair(("Model", "Distribution"), (model.name(), model.distribution().name())));
            for chunk in model.details().chunks(2) {
                match chunk {
                    [(l1, v1), (l2, v2)] => lines.push(pair((l1, l2), (v1, v2))),
                    [(label, value)] => lines.push(single(label, value)),
                    _ => {}
                }
            }
            let params = model.params();
            lines.push(single(
                "Parameters",
                &format!("loc={:.4}, scale={:.4}, xi={:.4}", params.loc, params.scale, params.shape),
            ));
            lines.push(pair(
                ("Log-likelihood", "AIC"),
                (&format!("{:.3}", model.log_likelihood()), &format!("{:.3}", model.aic())),
            ));
        }
    }
    lines.push("=".repeat(WIDTH));

    lines.join("\n")
}

fn center(text: &str) -> String {
    let len = text.chars().count();
    let left = WIDTH.saturating_sub(len) / 2;
    let right = WIDTH.saturating_sub(left + len);
    format!("{}{text}{}", " ".repeat(left), " ".repeat(right))
}

/// `label:` left, value right-aligned to the paired-line width.
fn single(label: &str, value: &str) -> String {
    let value_width = (WIDTH - SEP).saturating_sub(label.chars().count() + 1);
    format!("{label}:{value:>value_width$}")
}

/// Two `label: value` columns separated by [`SEP`] spaces.
fn pair(labels: (&str, &str), values: (&str, &str)) -> String {
    let lwidth = (WIDTH - SEP) / 2;
    let rwidth = WIDTH - (lwidth + SEP);
    let lpad = lwidth.saturating_sub(labels.0.chars().count() + 1);
    let rpad = rwidth.saturating_sub(labels.1.chars().count() + 1);
    format!(
        "{}:{:>lpad$}{}{}:{:>rpad$}",
        labels.0,
        values.0,
        " ".repeat(SEP),
        labels.1,
        values.1
    )
}
