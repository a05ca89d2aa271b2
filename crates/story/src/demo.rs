/// Built-in session run when no script is given.
pub const SCRIPT: &str = r#"
# nothing before the caret: palette stays closed
type Groceries
key Enter

# open, move around, pick Bullet List with the keyboard
type /
key ArrowDown
key ArrowDown
key ArrowUp
key ArrowDown
key ArrowDown
key Enter
type milk
key Enter
type eggs
key Enter
key Enter

# a range selection closes an open palette without editing
type /
select 0.0:0 0.0:4
select 3.0:1 3.0:1

# click Code Block
click 6
type let total = 3;

# slash followed by text is not a trigger
select 0.0:9 0.0:9
key Enter
type /h
key Backspace

# pick Heading 1, then one undo brings the trigger back
key Enter
undo
key Escape
click 7

# toolbar buttons act on the block holding the caret
toolbar sent
toolbar received
type !
"#;
