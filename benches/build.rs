//! Performance benchmarks for a3s-audit
//!
//! Run with: cargo bench

use a3s_audit::{
    AuditService, DetailField, EntityConfig, EventTypeOptions, MemorySink, MessageCompiler,
    Result, Traceable, TraceabilityConfig,
};
use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

struct City {
    population: u64,
}

impl Traceable for City {
    fn entity_kind(&self) -> &str {
        "City"
    }

    fn object_id(&self) -> String {
        "7".to_string()
    }

    fn snapshot(&self) -> Result<Value> {
        Ok(json!({"name": "Barcelona", "population": self.population}))
    }
}

fn test_service() -> AuditService {
    let config = TraceabilityConfig::new().entity(
        "City",
        EntityConfig::new().event(
            "population-change",
            EventTypeOptions::new()
                .message("%(objectName)s population is now %(details.population)i")
                .detail(
                    "population",
                    DetailField::default().computed(|c| c.get("population").cloned()),
                ),
        ),
    );
    AuditService::from_config(config, MemorySink::default()).unwrap()
}

fn bench_message_compile(c: &mut Criterion) {
    let fields = json!({
        "objectType": "City",
        "objectName": "Barcelona",
        "details": {"population": 2873000}
    });

    c.bench_function("MessageCompiler::compile", |b| {
        b.iter(|| {
            MessageCompiler::compile(
                "%(objectName)s population is now %(details.population)i",
                &fields,
            )
        });
    });
}

fn bench_build(c: &mut Criterion) {
    let service = test_service();
    let city = City { population: 2873000 };

    c.bench_function("AuditService::build", |b| {
        b.iter(|| service.build("population-change", None, Some(&city)).unwrap());
    });
}

fn bench_trace(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = test_service();
    let city = City { population: 2873000 };

    c.bench_function("AuditService::trace (memory)", |b| {
        b.to_async(&rt).iter(|| async {
            service
                .trace("population-change", None, Some(&city))
                .await
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_message_compile, bench_build, bench_trace);
criterion_main!(benches);
