/// Numeric identifier carried in a row's leading column.
/// Examples: `0`, `1024`, `1048577`
pub type RecordId = u64;
/// One delimited data row without its line terminator.
/// Example: `17,4,9931,23,180,6,2,77,41,3,1`
pub type RowLine = String;
/// Dataset-family suffix shared by sibling files in one directory.
/// Examples: `` (empty), `_1.3_0_0.33`
pub type FileSuffix = String;
