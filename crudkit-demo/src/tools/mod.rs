mod test_record;

pub use test_record::TestTool;
