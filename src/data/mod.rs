mod measurement_set;
pub use measurement_set::MeasurementSet;

mod reader;
pub use reader::{read_measurements, read_measurements_from_path, write_measurements};

mod sorted_array;
pub use sorted_array::SortedArray;
