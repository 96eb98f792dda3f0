mod staged;

pub use staged::StagedFile;
