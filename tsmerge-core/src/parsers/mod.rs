pub mod qt_ts;
