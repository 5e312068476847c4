//! End-to-end tests: Java sources on disk through the full pipeline

mod common;

use std::fs;

use clap::Parser;
use common::{assert_cycle_rotation, TestRepo};
use depsight_engine::{
    commands, AnalyzerConfig, Analyzer, Cli, DependencyEdge, DuplicationKind, EdgeKind, EngineError,
    ProjectAnalysis,
};

fn shop() -> TestRepo {
    TestRepo::new()
        .with_java(
            "com.shop",
            "App",
            r#"
public class App {
    public static void main(String[] args) {
        OrderService service = new OrderService(new InMemoryRepository());
        service.place(new Order("a", 10));
    }
}
"#,
        )
        .with_java(
            "com.shop",
            "OrderService",
            r#"
import com.shop.repo.Repository;

public class OrderService {
    private final Repository repository;

    public OrderService(Repository repository) {
        this.repository = repository;
    }

    public void place(Order order) {
        if (order.isValid()) {
            repository.save(order);
        }
    }
}
"#,
        )
        .with_java(
            "com.shop",
            "Order",
            r#"
public class Order {
    private final String id;
    private final int amount;

    public Order(String id, int amount) {
        this.id = id;
        this.amount = amount;
    }

    public boolean isValid() {
        return amount > 0;
    }

    public String getId() {
        return id;
    }
}
"#,
        )
        .with_java(
            "com.shop",
            "InMemoryRepository",
            r#"
import com.shop.repo.Repository;
import java.util.ArrayList;
import java.util.List;

public class InMemoryRepository implements Repository {
    private final List<Order> orders = new ArrayList<>();

    @Override
    public void save(Order order) {
        orders.add(order);
    }
}
"#,
        )
        .with_java(
            "com.shop.repo",
            "Repository",
            r#"
import com.shop.Order;

public interface Repository {
    void save(Order order);
}
"#,
        )
        .with_java(
            "com.shop",
            "Legacy",
            r#"
class Legacy {
    void unusedHelper() {
        System.out.println("old");
    }
}
"#,
        )
}

#[test]
fn test_dependencies_from_source() {
    let repo = shop();
    let analyzer = Analyzer::new(AnalyzerConfig::default());
    let result = analyzer.analyze_dependencies(repo.path()).unwrap();
    let deps = &result.graph.class_dependencies;

    let app = &deps["com.shop.App"];
    assert!(app.contains("com.shop.OrderService"));
    assert!(app.contains("com.shop.InMemoryRepository"));
    assert!(app.contains("com.shop.Order"));

    assert!(deps["com.shop.OrderService"].contains("com.shop.repo.Repository"));
    assert!(deps["com.shop.repo.Repository"].contains("com.shop.Order"));

    assert!(result.graph.edges.contains(&DependencyEdge {
        source: "com.shop.InMemoryRepository".to_string(),
        target: "com.shop.repo.Repository".to_string(),
        kind: EdgeKind::Implements,
    }));
    assert!(result.graph.edges.contains(&DependencyEdge {
        source: "com.shop.OrderService".to_string(),
        target: "com.shop.repo.Repository".to_string(),
        kind: EdgeKind::Calls,
    }));

    assert!(result.graph.package_dependencies["com.shop"].contains("com.shop.repo"));
    assert!(result.cycles.cycles.is_empty());
}

#[test]
fn test_unused_code_from_source() {
    let repo = shop();
    let result = Analyzer::new(AnalyzerConfig::default())
        .analyze_dependencies(repo.path())
        .unwrap();

    assert_eq!(result.unused_classes, vec!["com.shop.Legacy"]);

    let unused = &result.unused_methods;
    assert!(unused.contains(&"com.shop.Legacy.unusedHelper".to_string()));
    assert!(unused.contains(&"com.shop.Order.getId".to_string()));
    assert!(!unused.contains(&"com.shop.OrderService.place".to_string()));
    assert!(!unused.contains(&"com.shop.Order.isValid".to_string()));
    assert!(!unused.contains(&"com.shop.App.main".to_string()));
    // @Override keeps the implementation alive
    assert!(!unused.contains(&"com.shop.InMemoryRepository.save".to_string()));
}

#[test]
fn test_cycle_from_source() {
    let repo = TestRepo::new()
        .with_java("cyc", "A", "public class A { private B next; }")
        .with_java("cyc", "B", "public class B { private C next; }")
        .with_java("cyc", "C", "public class C { private A next; }");

    let analysis = Analyzer::new(AnalyzerConfig::default())
        .analyze_all(repo.path())
        .unwrap();
    let cycles = &analysis.dependencies.cycles.cycles;
    assert_eq!(cycles.len(), 1);
    assert_cycle_rotation(&cycles[0], &["cyc.A", "cyc.B", "cyc.C"]);

    for metrics in analysis.dependencies.coupling.entities.values() {
        assert!((metrics.instability - 0.5).abs() < 1e-9);
    }
    assert!(analysis
        .metrics
        .health
        .recommendations
        .iter()
        .any(|r| r.contains("circular")));
}

#[test]
fn test_self_calls_count_as_dependency() {
    let repo = TestRepo::new().with_java(
        "app",
        "Worker",
        r#"
public class Worker {
    public void run() {
        step();
    }

    private void step() {
    }
}
"#,
    );

    let result = Analyzer::new(AnalyzerConfig::default())
        .analyze_dependencies(repo.path())
        .unwrap();

    assert!(result.graph.class_dependencies["app.Worker"].contains("app.Worker"));
    let worker = result.coupling.get("app.Worker").unwrap();
    assert_eq!((worker.afferent, worker.efferent), (1, 1));
    assert!((worker.instability - 0.5).abs() < 1e-9);
    assert!(result.unused_classes.is_empty());
    assert_eq!(result.cycles.self_loops, vec!["app.Worker"]);
}

#[test]
fn test_duplicates_from_source() {
    let repo = TestRepo::new()
        .with_java(
            "dup",
            "Stats",
            r#"
public class Stats {
    public int sum(int[] values) {
        int total = 0;
        for (int v : values) {
            total += v;
        }
        return total;
    }
}
"#,
        )
        .with_java(
            "dup",
            "Totals",
            r#"
public class Totals {
    public int sum(int[] values) {
        // same loop, different layout
        int total = 0;
        for (int v : values) { total += v; }
        return total;
    }
}
"#,
        );

    let result = Analyzer::new(AnalyzerConfig::default())
        .analyze_metrics(repo.path())
        .unwrap();
    assert_eq!(result.duplicates.len(), 1);
    let group = &result.duplicates[0];
    assert_eq!(group.kind, DuplicationKind::Exact);
    assert_eq!(group.members, vec!["dup.Stats.sum(int[])", "dup.Totals.sum(int[])"]);
    assert!(result.project.duplication_ratio > 0.0);
}

#[test]
fn test_patterns_from_source() {
    let repo = TestRepo::new()
        .with_java(
            "app",
            "Clock",
            r#"
public final class Clock {
    private static final Clock INSTANCE = new Clock();

    private Clock() {
    }

    public static Clock getInstance() {
        return INSTANCE;
    }
}
"#,
        )
        .with_java(
            "app",
            "Shapes",
            r#"
public class Shapes {
    public static Shapes createDefault() {
        return new Shapes();
    }
}
"#,
        );

    let result = Analyzer::new(AnalyzerConfig::default())
        .analyze_patterns(repo.path())
        .unwrap();

    let elements = |pattern: &str| -> Vec<String> {
        result
            .matches_for(pattern)
            .iter()
            .map(|m| m.element.clone())
            .collect()
    };
    assert_eq!(elements("Singleton"), vec!["app.Clock"]);
    assert_eq!(elements("Factory"), vec!["app.Shapes"]);
    assert_eq!(elements("GetterSetter"), vec!["app.Clock.getInstance"]);
    assert!(elements("TestClass").is_empty());
}

#[test]
fn test_config_file_is_respected() {
    let repo = TestRepo::new()
        .with_java("dup", "A", "class A { int f(int x) { int y = x * 2 + 1; y += x; return y * y + x; } }")
        .with_java("dup", "B", "class B { int f(int x) { int y = x * 2 + 1; y += x; return y * y + x; } }")
        .with_config("[duplication]\nmin_body_length = 10000\ndetect_similar = false\n");

    let config = AnalyzerConfig::resolve(repo.path(), None).unwrap();
    assert_eq!(config.duplication.min_body_length, 10000);

    let result = Analyzer::new(config).analyze_metrics(repo.path()).unwrap();
    assert!(result.duplicates.is_empty());
}

#[test]
fn test_skipped_files_in_diagnostics() {
    let repo = shop();
    repo.add_file("src/main/java/com/shop/Broken.java", "@@@ ### not java at all");

    let analysis = Analyzer::new(AnalyzerConfig::default())
        .analyze_all(repo.path())
        .unwrap();
    assert_eq!(analysis.diagnostics.skipped_files.len(), 1);
    assert!(analysis.diagnostics.skipped_files[0].path.ends_with("Broken.java"));
    assert!(analysis.dependencies.graph.class_dependencies.contains_key("com.shop.App"));
}

#[test]
fn test_summary_counts_kinds() {
    let repo = shop().with_java("com.shop", "Status", "public enum Status { OPEN, CLOSED }");
    let summary = Analyzer::new(AnalyzerConfig::default())
        .quick_summary(repo.path())
        .unwrap();

    assert_eq!(summary.total_entities, 7);
    assert_eq!(summary.entities_by_kind.get("interface"), Some(&1));
    assert_eq!(summary.entities_by_kind.get("enum"), Some(&1));
    assert_eq!(summary.packages.get("com.shop.repo"), Some(&1));
    assert_eq!(summary.files_parsed, 7);
}

#[test]
fn test_empty_project() {
    let repo = TestRepo::new();
    repo.add_file("README.md", "# nothing here");
    let analyzer = Analyzer::new(AnalyzerConfig::default());

    assert!(matches!(
        analyzer.analyze_all(repo.path()),
        Err(EngineError::EmptyProject { .. })
    ));
    assert_eq!(analyzer.quick_summary(repo.path()).unwrap().total_entities, 0);
}

#[test]
fn test_cli_exports_artifacts() {
    let repo = shop();
    let out = repo.path().join("report");
    let project = repo.path().to_string_lossy().to_string();
    let out_arg = out.to_string_lossy().to_string();

    let cli = Cli::parse_from(["depsight", "all", project.as_str(), "-o", out_arg.as_str()]);
    let output = commands::run(&cli).unwrap();
    assert!(output.contains("DEPENDENCY ANALYSIS REPORT"));

    for name in ["dependencies.json", "metrics.json", "graph.json", "patterns.json", "analysis.json"] {
        assert!(out.join(name).exists(), "{} missing", name);
    }
    let text = fs::read_to_string(out.join("analysis.json")).unwrap();
    let analysis: ProjectAnalysis = serde_json::from_str(&text).unwrap();
    assert_eq!(analysis.dependencies.unused_classes, vec!["com.shop.Legacy"]);
}

#[test]
fn test_cli_invalid_root() {
    let cli = Cli::parse_from(["depsight", "dependency", "/no/such/project", "--no-export"]);
    let err = commands::run(&cli).unwrap_err();
    assert!(matches!(err, EngineError::InvalidProjectRoot { .. }));
}
