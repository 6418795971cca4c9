pub mod item_commands;
