//! Prometheus text exposition format.
//!
//! Renders the collector's state into the Prometheus text exposition
//! format for scraping by a Prometheus server or compatible agent.

use crate::collector::Collector;

/// Render the collector into Prometheus text format.
///
/// Produces COUNTER and GAUGE metrics; e2e latency samples are drained
/// and exported as a plain sum/count pair per queue.
pub fn render_prometheus(collector: &Collector) -> String {
    let mut out = String::new();

    out.push_str("# HELP flotilla_sessions_total Scheduling sessions completed.\n");
    out.push_str("# TYPE flotilla_sessions_total counter\n");
    out.push_str(&format!("flotilla_sessions_total {}\n", collector.sessions()));

    out.push_str("# HELP flotilla_scheduling_attempts_total Task scheduling attempts.\n");
    out.push_str("# TYPE flotilla_scheduling_attempts_total counter\n");
    out.push_str(&format!(
        "flotilla_scheduling_attempts_total {}\n",
        collector.attempts()
    ));

    out.push_str("# HELP flotilla_bindings_total Task bindings emitted.\n");
    out.push_str("# TYPE flotilla_bindings_total counter\n");
    out.push_str(&format!("flotilla_bindings_total {}\n", collector.bindings()));

    out.push_str("# HELP flotilla_evictions_total Task evictions emitted.\n");
    out.push_str("# TYPE flotilla_evictions_total counter\n");
    out.push_str(&format!("flotilla_evictions_total {}\n", collector.evictions()));

    out.push_str("# HELP flotilla_fit_errors_total Feasibility failures by reason.\n");
    out.push_str("# TYPE flotilla_fit_errors_total counter\n");
    for (reason, count) in collector.fit_errors() {
        out.push_str(&format!(
            "flotilla_fit_errors_total{{reason=\"{}\"}} {}\n",
            escape_label(&reason),
            count
        ));
    }

    out.push_str("# HELP flotilla_queue_allocated Queue allocation per resource dimension.\n");
    out.push_str("# TYPE flotilla_queue_allocated gauge\n");
    let queues = collector.queue_gauges();
    for (queue, gauges) in &queues {
        for (dim, value) in &gauges.allocated {
            out.push_str(&format!(
                "flotilla_queue_allocated{{queue=\"{queue}\",resource=\"{dim}\"}} {value:.2}\n"
            ));
        }
    }

    out.push_str("# HELP flotilla_queue_deserved Queue fair-share entitlement per resource dimension.\n");
    out.push_str("# TYPE flotilla_queue_deserved gauge\n");
    for (queue, gauges) in &queues {
        for (dim, value) in &gauges.deserved {
            out.push_str(&format!(
                "flotilla_queue_deserved{{queue=\"{queue}\",resource=\"{dim}\"}} {value:.2}\n"
            ));
        }
    }

    out.push_str("# HELP flotilla_queue_capability Queue hard cap per resource dimension.\n");
    out.push_str("# TYPE flotilla_queue_capability gauge\n");
    for (queue, gauges) in &queues {
        for (dim, value) in &gauges.capability {
            out.push_str(&format!(
                "flotilla_queue_capability{{queue=\"{queue}\",resource=\"{dim}\"}} {value:.2}\n"
            ));
        }
    }

    let samples = collector.take_e2e_samples();
    let mut by_queue: std::collections::BTreeMap<String, (f64, u64)> = Default::default();
    for s in &samples {
        let entry = by_queue.entry(s.queue.clone()).or_insert((0.0, 0));
        entry.0 += s.seconds;
        entry.1 += 1;
    }
    out.push_str("# HELP flotilla_e2e_scheduling_seconds_sum Job creation to first bind, summed.\n");
    out.push_str("# TYPE flotilla_e2e_scheduling_seconds_sum counter\n");
    for (queue, (sum, _)) in &by_queue {
        out.push_str(&format!(
            "flotilla_e2e_scheduling_seconds_sum{{queue=\"{queue}\"}} {sum:.3}\n"
        ));
    }
    out.push_str("# HELP flotilla_e2e_scheduling_seconds_count Jobs observed at first bind.\n");
    out.push_str("# TYPE flotilla_e2e_scheduling_seconds_count counter\n");
    for (queue, (_, count)) in &by_queue {
        out.push_str(&format!(
            "flotilla_e2e_scheduling_seconds_count{{queue=\"{queue}\"}} {count}\n"
        ));
    }

    out
}

fn escape_label(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::QueueGauges;

    #[test]
    fn renders_counters_and_labeled_series() {
        let c = Collector::new();
        c.record_session();
        c.record_binding();
        c.record_fit_error("insufficient cpu");
        c.set_queue_gauges(
            "q1",
            QueueGauges {
                allocated: [("cpu".to_string(), 1500.0)].into(),
                deserved: [("cpu".to_string(), 2000.0)].into(),
                capability: [("cpu".to_string(), 4000.0)].into(),
            },
        );
        c.observe_e2e("ns1/j1", "q1", 3.5);

        let text = render_prometheus(&c);
        assert!(text.contains("flotilla_sessions_total 1"));
        assert!(text.contains("flotilla_bindings_total 1"));
        assert!(text.contains("flotilla_fit_errors_total{reason=\"insufficient cpu\"} 1"));
        assert!(text.contains("flotilla_queue_allocated{queue=\"q1\",resource=\"cpu\"} 1500.00"));
        assert!(text.contains("flotilla_e2e_scheduling_seconds_count{queue=\"q1\"} 1"));
    }
}
