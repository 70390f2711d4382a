use std::fmt;

use orion_error::ErrorOweBase;
use rq_lang::{PredicateCompiler, Value};

use crate::client::QueryClient;
use crate::error::{ClientReason, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        })
    }
}

/// A query against one resource collection, composed from predicate and
/// selector text and rendered as `<base_uri>/<uri>?$filter=...`.
///
/// Nothing is compiled until [`params`](Self::params) or
/// [`to_uri`](Self::to_uri) is called; the first failing clause aborts.
#[derive(Debug, Clone)]
pub struct RestQuery<'a> {
    client: &'a QueryClient,
    resource: String,
    path: String,
    filters: Vec<String>,
    order: Vec<(String, SortDirection)>,
    select: Vec<String>,
    expand: Vec<String>,
    top: Option<u32>,
    skip: Option<u32>,
    variables: Vec<(String, Value)>,
}

impl<'a> RestQuery<'a> {
    pub(crate) fn new(client: &'a QueryClient, resource: &str, path: &str) -> Self {
        Self {
            client,
            resource: resource.to_string(),
            path: path.trim_matches('/').to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            select: Vec::new(),
            expand: Vec::new(),
            top: None,
            skip: None,
            variables: Vec::new(),
        }
    }

    /// Add a predicate; several predicates are joined with `and`.
    pub fn filter(mut self, predicate: impl Into<String>) -> Self {
        self.filters.push(predicate.into());
        self
    }

    pub fn order_by(self, selector: impl Into<String>) -> Self {
        self.order(selector, SortDirection::Asc)
    }

    pub fn order_by_desc(self, selector: impl Into<String>) -> Self {
        self.order(selector, SortDirection::Desc)
    }

    /// Add an ordering key; keys apply in the order they are added.
    pub fn order(mut self, selector: impl Into<String>, direction: SortDirection) -> Self {
        self.order.push((selector.into(), direction));
        self
    }

    pub fn select(mut self, selector: impl Into<String>) -> Self {
        self.select.push(selector.into());
        self
    }

    pub fn expand(mut self, selector: impl Into<String>) -> Self {
        self.expand.push(selector.into());
        self
    }

    pub fn top(mut self, n: u32) -> Self {
        self.top = Some(n);
        self
    }

    pub fn skip(mut self, n: u32) -> Self {
        self.skip = Some(n);
        self
    }

    /// Value for `@name` in any clause of this query.
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.push((name.into(), value));
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    fn compiler(&self) -> PredicateCompiler<'a> {
        self.variables
            .iter()
            .fold(self.client.compiler(), |c, (name, value)| {
                c.with_variable(name.clone(), value.clone())
            })
    }

    /// Query options in a fixed order (`$filter`, `$orderby`, `$select`,
    /// `$expand`, `$top`, `$skip`), values not yet URL-encoded. Empty
    /// options are left out; `$top` falls back to `service.default_top`.
    pub fn params(&self) -> ClientResult<Vec<(&'static str, String)>> {
        let compiler = self.compiler();
        let mut params = Vec::new();

        let filters = self
            .filters
            .iter()
            .map(|f| self.translate(&compiler, f, true))
            .collect::<ClientResult<Vec<_>>>()?;
        match filters.as_slice() {
            [] => {}
            [only] => params.push(("$filter", only.clone())),
            many => params.push((
                "$filter",
                many.iter()
                    .map(|f| format!("({f})"))
                    .collect::<Vec<_>>()
                    .join(" and "),
            )),
        }

        let order = self
            .order
            .iter()
            .map(|(selector, dir)| {
                let key = self.translate(&compiler, selector, false)?;
                Ok(match dir {
                    SortDirection::Asc => key,
                    SortDirection::Desc => format!("{key} desc"),
                })
            })
            .collect::<ClientResult<Vec<_>>>()?;
        if !order.is_empty() {
            params.push(("$orderby", order.join(",")));
        }

        for (option, selectors) in [("$select", &self.select), ("$expand", &self.expand)] {
            let paths = selectors
                .iter()
                .map(|s| self.translate(&compiler, s, false))
                .collect::<ClientResult<Vec<_>>>()?;
            if !paths.is_empty() {
                params.push((option, paths.join(",")));
            }
        }

        if let Some(top) = self.top.or(self.client.config().service.default_top) {
            params.push(("$top", top.to_string()));
        }
        if let Some(skip) = self.skip {
            params.push(("$skip", skip.to_string()));
        }
        Ok(params)
    }

    /// Full request URI. Identical queries give identical URIs.
    pub fn to_uri(&self) -> ClientResult<String> {
        let params = self.params()?;
        let base = self.client.config().service.base();
        let mut uri = format!("{base}/{}", self.path);
        for (i, (key, value)) in params.iter().enumerate() {
            uri.push(if i == 0 { '?' } else { '&' });
            uri.push_str(key);
            uri.push('=');
            uri.push_str(&urlencoding::encode(value));
        }
        rq_debug!(xlat, resource = %self.resource, uri = %uri, "query composed");
        Ok(uri)
    }

    fn translate(
        &self,
        compiler: &PredicateCompiler<'_>,
        source: &str,
        predicate: bool,
    ) -> ClientResult<String> {
        let result = if predicate {
            compiler.compile(source, &self.resource)
        } else {
            compiler.compile_selector(source, &self.resource)
        };
        result
            .owe(ClientReason::Translate)
            .map_err(|e| e.with_detail(format!("while compiling `{source}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rq_config::RqConfig;
    use rq_lang::ResourceCatalog;

    const SCHEMA: &str = r#"
enum Status { Active = 1, Retired = 2 }
value Item { fields { Price: int32 } }
resource Critter {
    uri = "critters"
    fields {
        Name: string
        Age: int32
        Status: Status
        Friend: Critter
        Items: list<Item>
    }
}
"#;

    fn client(extra: &str) -> QueryClient {
        let config: RqConfig = format!("[service]\nbase_uri = \"https://api.example.com/v1/\"\n{extra}")
            .parse()
            .unwrap();
        QueryClient::with_catalog(config, ResourceCatalog::parse(SCHEMA).unwrap())
    }

    #[test]
    fn bare_query_is_the_collection_uri() {
        let c = client("");
        assert_eq!(
            c.query("Critter").unwrap().to_uri().unwrap(),
            "https://api.example.com/v1/critters"
        );
    }

    #[test]
    fn filter_is_url_encoded() {
        let c = client("");
        let uri = c
            .query("Critter")
            .unwrap()
            .filter(r#"x => x.Age > 18 && x.Name == "bob""#)
            .to_uri()
            .unwrap();
        assert_eq!(
            uri,
            "https://api.example.com/v1/critters?$filter=age%20gt%2018%20and%20name%20eq%20%27bob%27"
        );
    }

    #[test]
    fn all_options_in_fixed_order() {
        let c = client("default_top = 25\n");
        let q = c
            .query("Critter")
            .unwrap()
            .skip(50)
            .expand("x => x.Friend")
            .select("x => x.Name")
            .order_by_desc("x => x.Age")
            .order_by("x => x.Name")
            .filter("x => x.Status == Status.Active");
        let params = q.params().unwrap();
        let keys: Vec<_> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec!["$filter", "$orderby", "$select", "$expand", "$top", "$skip"]
        );
        assert_eq!(params[0].1, "status eq 'Active'");
        assert_eq!(params[1].1, "age desc,name");
        assert_eq!(params[2].1, "name");
        assert_eq!(params[3].1, "friend");
        assert_eq!(params[4].1, "25");
        assert_eq!(params[5].1, "50");
        assert_eq!(q.to_uri().unwrap(), q.to_uri().unwrap());
    }

    #[test]
    fn explicit_top_overrides_default() {
        let c = client("default_top = 25\n");
        let params = c.query("Critter").unwrap().top(5).params().unwrap();
        assert_eq!(params, vec![("$top", "5".to_string())]);
    }

    #[test]
    fn several_filters_are_conjoined() {
        let c = client("");
        let params = c
            .query("Critter")
            .unwrap()
            .filter("x => x.Age > 1 || x.Age < 0")
            .filter(r#"x => x.Name != "a""#)
            .params()
            .unwrap();
        assert_eq!(
            params[0].1,
            "(age gt 1 or age lt 0) and (name ne 'a')"
        );
    }

    #[test]
    fn variables_are_inlined() {
        let c = client("");
        let params = c
            .query("Critter")
            .unwrap()
            .with_variable("min", Value::Int32(3))
            .filter("x => x.Items.Any(i => i.Price >= @min)")
            .params()
            .unwrap();
        assert_eq!(params[0].1, "items.any(i:i.price ge 3)");
    }

    #[test]
    fn failing_clause_is_a_translate_error() {
        let c = client("");
        let err = c
            .query("Critter")
            .unwrap()
            .filter("x => x.Nope == 1")
            .to_uri()
            .unwrap_err();
        assert_eq!(err.reason(), &ClientReason::Translate);
    }
}
