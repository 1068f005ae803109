pub use sample::{DecaySample, decay_sample, default_decay_sample};

mod sample;
