pub mod testutil;
