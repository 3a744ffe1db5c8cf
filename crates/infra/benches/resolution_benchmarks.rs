use std::sync::Arc;

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use warden_auth::fixtures::Catalog;
use warden_auth::{project_all_menus, resolve, DirectGrantRow, RoleGrantRow};
use warden_infra::{AccessService, InMemoryEntityStore};

const ACTIONS: [&str; 4] = ["READ", "CREATE", "UPDATE", "DELETE"];

/// `apps` applications × 4 modules × 5 options, one role per application
/// holding every action, plus a direct grant per option.
fn fixture(apps: usize) -> (Catalog, Vec<DirectGrantRow>, Vec<RoleGrantRow>) {
    let mut catalog = Catalog::new();
    let mut direct = Vec::new();
    let mut roles = Vec::new();

    for a in 0..apps {
        let app = catalog.application(&format!("APP{a}"));
        let role = catalog.role(&app, "OPERATOR");
        let mut records = Vec::new();
        for m in 0..4 {
            let module = catalog.module(&app, &format!("MOD{m}"), m);
            for o in 0..5 {
                let option = catalog.option(&module, &format!("OPT{m}_{o}"));
                for action in ACTIONS {
                    records.push(catalog.record(&role, &option, action));
                }
                direct.push(catalog.direct(catalog.record(&role, &option, "EXPORT"), None));
            }
        }
        roles.extend(catalog.role_grants(&role, records));
    }

    (catalog, direct, roles)
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    for apps in [1usize, 10, 50] {
        let (_catalog, direct, roles) = fixture(apps);
        group.throughput(Throughput::Elements((direct.len() + roles.len()) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(apps), &apps, |b, _| {
            let now = Utc::now();
            b.iter(|| black_box(resolve(black_box(&direct), black_box(&roles), now)));
        });
    }
    group.finish();
}

fn bench_menus(c: &mut Criterion) {
    let mut group = c.benchmark_group("project_all_menus");
    for apps in [1usize, 10, 50] {
        let (_catalog, direct, roles) = fixture(apps);
        let resolved = resolve(&direct, &roles, Utc::now());
        group.bench_with_input(BenchmarkId::from_parameter(apps), &resolved, |b, resolved| {
            b.iter(|| black_box(project_all_menus(black_box(resolved))));
        });
    }
    group.finish();
}

fn bench_access_service(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build runtime");

    let (catalog, direct, roles) = fixture(10);
    let store = Arc::new(InMemoryEntityStore::new());
    for row in &direct {
        store.load_direct_grant(row).expect("load direct grant");
    }
    for row in &roles {
        store.load_role_grant(row).expect("load role grant");
    }
    let access = AccessService::new(Arc::clone(&store));
    let user_id = catalog.user_id();

    c.bench_function("access_service/project_all_menus", |b| {
        b.iter(|| {
            runtime
                .block_on(access.project_all_menus(user_id))
                .expect("menus")
        });
    });
}

criterion_group!(benches, bench_resolve, bench_menus, bench_access_service);
criterion_main!(benches);
