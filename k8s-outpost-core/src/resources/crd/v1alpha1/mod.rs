pub mod virtual_node;
