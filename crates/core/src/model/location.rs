#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub uuid: String,
    pub name: String,
    pub description: Option<String>,
    pub retired: bool,
}
