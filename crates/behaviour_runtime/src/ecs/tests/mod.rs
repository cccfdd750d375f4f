//! Cross-module behaviour tests: lifecycle, frame events, queries and resources
