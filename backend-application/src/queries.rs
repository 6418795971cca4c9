pub mod item_queries;
