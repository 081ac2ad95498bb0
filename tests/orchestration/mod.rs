mod async_processing_tests;
mod health_tests;
mod sync_generation_tests;
