use crate::catalog::ResourceCatalog;

pub(crate) const CRITTERS: &str = r#"
# Shared test schema
enum Status : int32 { Active = 1, Retired = 2 }
enum Size : byte { Small, Medium, Large }

value Item {
    fields {
        Price: int32
        Owner: string
        Label: string as "tag"
    }
}

resource Critter {
    uri = "critters"
    fields {
        Name: string
        Age: int32
        Serial: int64
        Weight: int32?
        Height: double
        Cost: decimal
        IsCute: bool
        Born: datetime
        Key: guid
        Status: Status
        PreviousStatus: Status?
        Size: Size
        Tags: list<string>
        Items: list<Item>
        Orders: query<Item>
        Friends: list<Critter>
        Friend: Critter
        Attributes: map<string, string>
        Nick: string as "nickname"
    }
}

resource Dog {
    base = Critter
    json = "Hound"
    fields {
        Bark: string
    }
}
"#;

pub(crate) fn critters() -> ResourceCatalog {
    ResourceCatalog::parse(CRITTERS).unwrap_or_else(|e| panic!("fixture schema: {e}"))
}
