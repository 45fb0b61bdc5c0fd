//! Prometheus counters for transforms and image probes, served on `/metrics`.
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use wpcc_parser::{ImageProbe, TransformOutcome};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    transforms: IntCounterVec,
    probes: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let transforms = IntCounterVec::new(
            Opts::new("wpcc_transform_total", "Responses seen by the transformer, by outcome"),
            &["outcome"],
        )?;
        let probes = IntCounterVec::new(
            Opts::new("wpcc_probe_total", "Image probes, by result"),
            &["result"],
        )?;
        registry.register(Box::new(transforms.clone()))?;
        registry.register(Box::new(probes.clone()))?;
        Ok(Self {
            registry,
            transforms,
            probes,
        })
    }

    pub fn record_transform(&self, outcome: TransformOutcome) {
        self.transforms.with_label_values(&[outcome.as_str()]).inc();
    }

    pub fn record_skipped(&self) {
        self.transforms.with_label_values(&["skipped"]).inc();
    }

    pub fn transform_count(&self, outcome: &str) -> u64 {
        self.transforms.with_label_values(&[outcome]).get()
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}

/// Wraps a probe and counts its answers
pub struct CountingProbe {
    inner: Arc<dyn ImageProbe>,
    counter: IntCounterVec,
}

impl CountingProbe {
    pub fn new(inner: Arc<dyn ImageProbe>, metrics: &Metrics) -> Self {
        Self {
            inner,
            counter: metrics.probes.clone(),
        }
    }
}

impl ImageProbe for CountingProbe {
    fn is_image(&self, url: &str) -> bool {
        let answer = self.inner.is_image(url);
        let label = if answer { "image" } else { "not_image" };
        self.counter.with_label_values(&[label]).inc();
        answer
    }
}
