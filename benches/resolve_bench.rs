//! Consent resolution and header assembly throughput.

use consentkit_core::catalog::categories::configuration_changed;
use consentkit_core::consent::resolver::ConsentResolver;
use consentkit_core::consent::store::ConsentStore;
use consentkit_core::logging::structured::LogContext;
use consentkit_core::security::headers::SecurityHeaderBuilder;
use consentkit_core::security::nonce::CspNonce;
use consentkit_core::{process_request, RequestInput, RequestKind, Settings};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::Value;

fn settings(groups: usize) -> Settings {
    let mut settings = Settings::default();
    settings.csp_enabled = true;
    settings.hsts_enabled = true;
    settings.permissions_policy_enabled = true;
    settings.permissions_policy = "camera=(),\nmicrophone=()".to_string();

    let text: String = (0..groups)
        .map(|i| format!("---vendor{i}|Vendor {i}\ncookie{i}|vendor{i}.example|Embeds|1 year\n"))
        .collect();
    settings
        .category_fields
        .insert("external_cookies".into(), Value::String(text));
    settings
        .category_fields
        .insert("statistics_enabled".into(), Value::Bool(true));
    settings
}

fn cookie(groups: usize) -> String {
    let external: Vec<String> = (0..groups)
        .map(|i| format!("\"vendor{i}\":{}", i % 2 == 0))
        .collect();
    format!(
        r#"{{"statistics":true,"marketing":false,"external":{{{}}},"_version":1}}"#,
        external.join(",")
    )
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("consent/resolve");
    let ctx = LogContext::new("req-bench");

    for groups in [1usize, 10, 50] {
        let settings = settings(groups);
        let catalog = configuration_changed(&settings);
        let raw = cookie(groups);
        let store = ConsentStore::default();

        group.bench_with_input(BenchmarkId::from_parameter(groups), &raw, |b, raw| {
            b.iter(|| {
                let reading = store.read(Some(black_box(raw)), &ctx);
                ConsentResolver::new(&catalog, &reading.flat_map).resolve(&ctx)
            });
        });
    }

    group.finish();
}

fn bench_headers(c: &mut Criterion) {
    let settings = settings(1);
    let ctx = LogContext::new("req-bench");
    let nonce = CspNonce::generate();

    c.bench_function("security/headers", |b| {
        b.iter(|| SecurityHeaderBuilder::new(&settings).build(black_box(&nonce), true, &ctx));
    });
}

fn bench_full_request(c: &mut Criterion) {
    let settings = settings(10);
    let catalog = configuration_changed(&settings);
    let input = RequestInput {
        consent_cookie: Some(cookie(10)),
        host: "www.example.com".to_string(),
        secure: true,
        kind: RequestKind::Page,
    };

    c.bench_function("pipeline/process_request", |b| {
        b.iter(|| process_request(&settings, &catalog, black_box(&input)));
    });
}

criterion_group!(benches, bench_resolution, bench_headers, bench_full_request);
criterion_main!(benches);
