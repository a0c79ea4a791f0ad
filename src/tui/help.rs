//! Help text content for the help modal

/// About section shown at the top of the help modal.
pub fn get_about_help() -> Vec<String> {
    vec![
        "About thermogrid".to_string(),
        format!("  Version {}", env!("CARGO_PKG_VERSION")),
        "  Temperature readings grid with derived columns, charts and reports.".to_string(),
        "  Cyan columns are computed and cannot be edited.".to_string(),
        "  ¹ / ² after a header marks membership of chart 1 / chart 2.".to_string(),
    ]
}

/// Keybinding help text
pub fn get_help_text() -> Vec<String> {
    vec![
        "Navigation:",
        "  h/j/k/l      Move left/down/up/right",
        "  Arrow keys   Move cursor",
        "  PageUp/Down  Scroll by page",
        "  0 / $        First/last column",
        "  g / G        First/last row",
        "",
        "Editing:",
        "  i / Enter    Edit cell",
        "  o            Append row",
        "  Esc          Cancel edit",
        "  u / Ctrl+r   Undo / redo",
        "",
        "Charts:",
        "  !  /  @      Toggle column in chart 1 / chart 2",
        "  1  /  2      Show chart 1 / chart 2",
        "",
        "Other:",
        "  :            Enter command mode",
        "  +/-          Adjust column width",
        "  ?            This help",
        "  q            Quit",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Get command help text
pub fn get_commands_help() -> Vec<String> {
    vec![
        "Commands",
        "",
        "File:",
        "  :e <file>            Import .xlsx/.xls/.ods/.csv",
        "  :w [file.docx]       Export Word report with charts",
        "  :md [file.md]        Export Markdown report",
        "  :q                   Quit",
        "  :q!                  Force quit",
        "",
        "Columns and rows:",
        "  :col <key> <Label> [text|num|date]",
        "                       Add a raw column",
        "  :col <key> <Label> =<formula>",
        "                       Add a computed column, e.g.",
        "                       =ABS({thermocouple2_middle} - {thermocouple3_top})",
        "  :move <key> <n>      Move a column to position n",
        "  :row                 Append row",
        "",
        "Charts:",
        "  :chart1 a,b          Select columns for chart 1",
        "  :chart2 a,b          Select columns for chart 2",
        "  :chart1              Clear chart 1",
        "",
        "Backend:",
        "  :verify [token]      Load the session's stored dataset",
        "  :submit              Send dataset and charts",
        "",
        "History:",
        "  :undo / :redo",
        "",
        "Display:",
        "  :colwidth <n>        Set column width",
        "",
        "Press Esc or q to close",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}
