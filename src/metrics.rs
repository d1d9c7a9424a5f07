//! Prometheus text exposition of a collection pass

use std::fmt::Write;

use crate::collector::CollectionResult;

const NAMESPACE: &str = "version";

/// Content type of the Prometheus text format
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

struct Gauge {
    name: &'static str,
    help: &'static str,
}

const UP: Gauge = Gauge {
    name: "up",
    help: "Exporter is being able to talk with GitHub API",
};

const UP_TO_DATE: Gauge = Gauge {
    name: "up_to_date",
    help: "Whether the repository latest version is in the specified semantic versioning range",
};

const SCRAPE_DURATION: Gauge = Gauge {
    name: "scrape_duration_seconds",
    help: "Returns how long the probe took to complete in seconds",
};

impl Gauge {
    fn header(&self, out: &mut String) {
        let _ = writeln!(out, "# HELP {}_{} {}", NAMESPACE, self.name, self.help);
        let _ = writeln!(out, "# TYPE {}_{} gauge", NAMESPACE, self.name);
    }

    fn sample(&self, out: &mut String, labels: &[(&str, &str)], value: f64) {
        let _ = write!(out, "{}_{}", NAMESPACE, self.name);
        if !labels.is_empty() {
            let labels: Vec<String> = labels
                .iter()
                .map(|(name, value)| format!("{}=\"{}\"", name, escape_label_value(value)))
                .collect();
            let _ = write!(out, "{{{}}}", labels.join(","));
        }
        let _ = writeln!(out, " {}", value);
    }
}

fn bool_to_float(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', r"\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Render a collection pass in the Prometheus text format.
///
/// Labels are written in lexical order (`constraint`, `latest`, `repository`).
pub fn render(result: &CollectionResult) -> String {
    let mut out = String::new();

    UP.header(&mut out);
    UP.sample(&mut out, &[], bool_to_float(result.success));

    if !result.repositories.is_empty() {
        UP_TO_DATE.header(&mut out);
        for status in &result.repositories {
            UP_TO_DATE.sample(
                &mut out,
                &[
                    ("constraint", status.constraint.as_str()),
                    ("latest", status.latest.as_str()),
                    ("repository", status.repository.as_str()),
                ],
                bool_to_float(status.up_to_date),
            );
        }
    }

    SCRAPE_DURATION.header(&mut out);
    SCRAPE_DURATION.sample(&mut out, &[], result.duration.as_secs_f64());

    out
}
