#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProcessError {
    TableFull,
}
