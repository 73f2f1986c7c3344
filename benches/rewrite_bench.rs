//! Rewrite and import pruning benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use svgembed::*;

fn module_source(icons: usize) -> String {
    let mut content = String::from(
        "import { fas } from '@fortawesome/free-solid-svg-icons';\n\
         import { faIconToString } from '@xrnoz/vuetify-svg-icons';\n\n\
         export const icons = {\n",
    );
    for i in 0..icons {
        content.push_str(&format!("    icon{}: faIconToString(fas.faIcon{}),\n", i, i % 50));
    }
    content.push_str("};\n");
    content
}

fn icon_pack() -> IconPack {
    (0..50)
        .map(|i| {
            (
                format!("faIcon{}", i),
                IconDefinition::new(512, 512, format!("M{} 0L512 {}Z", i, i)),
            )
        })
        .collect()
}

fn bench_rewrite(c: &mut Criterion) {
    let content = module_source(1000);
    let pack = icon_pack();
    let extractor = Extractor::Standard;

    for scan in [ArgumentScan::Balanced, ArgumentScan::NonWhitespace] {
        let rewriter = CallSiteRewriter::new("faIconToString", scan).unwrap();
        c.bench_function(&format!("rewrite_{:?}", scan).to_lowercase(), |b| {
            b.iter(|| {
                rewriter.rewrite(black_box(&content), |identifier| {
                    pack.get(identifier).map(|definition| extractor.encode(definition))
                })
            })
        });
    }
}

fn bench_prune(c: &mut Criterion) {
    let content = module_source(1000);
    let pruner = ImportPruner::new();
    let targets = ["@fortawesome/free-solid-svg-icons", "@xrnoz/vuetify-svg-icons"];

    c.bench_function("prune_imports", |b| {
        b.iter(|| pruner.prune(black_box(&content), &targets))
    });
}

criterion_group!(benches, bench_rewrite, bench_prune);
criterion_main!(benches);
