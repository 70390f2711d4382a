use std::io::Write;
use std::sync::{Arc, Mutex};

use rq_client::tracing_init::DomainFormat;
use rq_client::{ClientReason, QueryClient};
use rq_lang::Value;

const SCHEMA: &str = r#"
enum Status { Active = 1, Retired = 2 }

value Line {
    fields {
        Sku: string
        Qty: int32
    }
}

resource Order {
    uri = "sales/orders"
    fields {
        Number: string as "no"
        Total: decimal
        Status: Status
        Placed: datetime
        Lines: list<Line>
        Customer: Customer
    }
}

resource Customer {
    uri = "customers"
    fields {
        Name: string
        Region: string?
    }
}
"#;

fn workspace(config: &str) -> (tempfile::TempDir, QueryClient) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("schema")).unwrap();
    std::fs::write(dir.path().join("schema/sales.rqs"), SCHEMA).unwrap();
    std::fs::write(dir.path().join("rq.toml"), config).unwrap();
    let client = QueryClient::open(dir.path().join("rq.toml")).unwrap();
    (dir, client)
}

const CONFIG: &str = r#"
[service]
base_uri = "https://shop.example.com/api/"
default_top = 50

[schema]
files = "schema/*.rqs"
"#;

#[test]
fn order_query_end_to_end() {
    let (_dir, client) = workspace(CONFIG);
    let uri = client
        .query("Order")
        .unwrap()
        .filter("o => o.Status == Status.Active && o.Lines.Any(l => l.Qty > 2)")
        .order_by_desc("o => o.Placed")
        .expand("o => o.Customer")
        .to_uri()
        .unwrap();
    assert_eq!(
        uri,
        "https://shop.example.com/api/sales/orders\
         ?$filter=status%20eq%20%27Active%27%20and%20lines.any%28l%3Al.qty%20gt%202%29\
         &$orderby=placed%20desc\
         &$expand=customer\
         &$top=50"
    );
}

#[test]
fn external_names_and_variables() {
    let (_dir, client) = workspace(CONFIG);
    let params = client
        .query("Order")
        .unwrap()
        .with_variable("no", Value::String("A-1".into()))
        .filter("o => o.Number == @no")
        .select("o => o.Customer.Name")
        .skip(10)
        .params()
        .unwrap();
    assert_eq!(
        params,
        vec![
            ("$filter", "no eq 'A-1'".to_string()),
            ("$select", "customer.name".to_string()),
            ("$top", "50".to_string()),
            ("$skip", "10".to_string()),
        ]
    );
}

#[test]
fn declared_naming_from_config() {
    let config = format!("{CONFIG}\n[translator]\nmember_naming = \"declared\"\n");
    let (_dir, client) = workspace(&config);
    let params = client
        .query("Customer")
        .unwrap()
        .filter("c => c.Name == null")
        .top(1)
        .params()
        .unwrap();
    assert_eq!(params[0].1, "Name eq null");
    assert_eq!(params[1], ("$top", "1".to_string()));
}

#[test]
fn untranslatable_filter_reports_translate_reason() {
    let (_dir, client) = workspace(CONFIG);
    let err = client
        .query("Order")
        .unwrap()
        .filter("o => o.Lines.Count() > o.Missing")
        .to_uri()
        .unwrap_err();
    assert_eq!(err.reason(), &ClientReason::Translate);
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn compile_events_carry_domain_prefix() {
    let (_dir, client) = workspace(CONFIG);
    let captured = Captured::default();
    let sink = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .event_format(DomainFormat::new())
        .with_writer(move || sink.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        client
            .query("Customer")
            .unwrap()
            .filter(r#"c => c.Name == "ann""#)
            .to_uri()
            .unwrap();
    });

    let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    assert!(out.contains("[xlat] compiled"), "{out}");
    assert!(out.contains("[xlat] query composed"), "{out}");
}
