use cochart::assets::AssetLoader;
use cochart::clock::{Clock, TokioClock};
use cochart::pipeline::ChartPipeline;
use cochart::platform::accessibility::{AccessibilityNode, AccessibilityTree};
use cochart::platform::{DeviceMetrics, Page, Viewport};
use cochart::rendering::{RendererOptions, SvgBarRenderer};
use cochart::{PipelineConfig, Settings};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

fn gold_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("tests/goldens/access");
    p.push(name);
    p
}

fn snapshot(nodes: &[AccessibilityNode], depth: usize, out: &mut String) {
    for n in nodes {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&n.role);
        if let Some(d) = &n.description {
            out.push_str(&format!(" [{}]", d));
        }
        if let Some(name) = &n.name {
            out.push_str(&format!(" \"{}\"", name));
        }
        out.push('\n');
        snapshot(&n.children, depth + 1, out);
    }
}

async fn render_tree(viewport: Viewport) -> AccessibilityTree {
    let config = PipelineConfig::default();
    let page = Arc::new(Page::new(DeviceMetrics { viewport, ..DeviceMetrics::default() }));
    let container = page.add_container(&config.container_id);
    let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
    let public = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public");
    let loader = AssetLoader::from_location(public.to_str().unwrap(), &config).expect("loader");
    let renderer = Arc::new(SvgBarRenderer::new(clock.clone(), RendererOptions::default()));
    let settings = Settings::default().with_animations(false).settings;

    let pipeline = ChartPipeline::new(config, page, loader, renderer, clock, settings);
    pipeline.init().await;
    pipeline.settle().await;
    container.with_document(AccessibilityTree::export).expect("chart mounted")
}

fn check_golden(name: &str, snap: &str) {
    let expected_path = gold_path(name);

    // UPDATE_GOLDENS writes the golden; a missing golden skips the comparison
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all(gold_path("")).ok();
        fs::write(&expected_path, snap).expect("write access golden");
        println!("Updated access golden: {:?}", expected_path);
        return;
    }
    if !expected_path.exists() {
        println!("No access golden at {:?}; run with UPDATE_GOLDENS=1 to create it. Skipping.", expected_path);
        return;
    }

    let exp = fs::read_to_string(&expected_path).expect("unable to read expected access golden");
    assert_eq!(snap, exp);
}

#[tokio::test(start_paused = true)]
async fn desktop_chart_is_accessible() {
    let tree = render_tree(Viewport::default()).await;
    let nodes = tree.walk();

    assert_eq!(nodes[0].role, "graphics-document");
    assert_eq!(nodes[0].name.as_deref(), Some("Colorado's Most Populous Cities"));

    let bars: Vec<_> = nodes.iter().filter(|n| n.description.as_deref() == Some("bar")).collect();
    assert_eq!(bars.len(), 15);
    assert!(bars.iter().all(|b| b.role == "graphics-symbol"));
    assert!(bars.iter().all(|b| b.name.as_deref().is_some_and(|l| l.contains("pop: ") && l.contains("density: "))));

    let legends: Vec<_> = nodes.iter().filter(|n| n.description.as_deref() == Some("legend")).collect();
    assert_eq!(legends.len(), 1);
    assert!(legends[0].name.as_deref().is_some_and(|l| l.contains("density")));
    assert_eq!(nodes.iter().filter(|n| n.description.as_deref() == Some("axis")).count(), 2);

    let mut snap = String::new();
    snapshot(&tree.nodes, 0, &mut snap);
    check_golden("desktop.access.txt", &snap);
}

#[tokio::test(start_paused = true)]
async fn small_mobile_chart_keeps_the_same_roles() {
    let desktop = render_tree(Viewport::default()).await;
    let mobile = render_tree(Viewport { width: 375, height: 667 }).await;

    let roles = |t: &AccessibilityTree| -> Vec<(String, Option<String>)> {
        t.walk().iter().map(|n| (n.role.clone(), n.description.clone())).collect()
    };
    assert_eq!(roles(&desktop), roles(&mobile));

    let mut snap = String::new();
    snapshot(&mobile.nodes, 0, &mut snap);
    check_golden("small-mobile.access.txt", &snap);
}
