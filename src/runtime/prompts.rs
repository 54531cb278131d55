//! Instructions sent to the agent at each phase of a run.

const SYSTEM_BASE: &str = "You are playing Tic-Tac-Toe against a human in a web browser. \
You control the browser only through the `computer` tool: take screenshots to see the \
board and click inside a cell to place your mark.

Rules: the board is a 3x3 grid. You are X and you move first; the human is O. \
Three marks in a row, column or diagonal win. A full board without a line is a draw.

Each cell shows a small label in its top-left corner (TOP-LEFT, CENTER, BOT-RIGHT and so \
on). The board is not centered on the page, so read the labels and click the middle of \
the cell you want rather than the middle of the screen.

Each turn:
1. Take a screenshot and count which cells hold X, which hold O and which are empty.
2. Win if you can, otherwise block a line of two O's, otherwise prefer the center, then corners.
3. Click an empty cell and take a screenshot to confirm your X appeared. If it did not, \
the cell was taken; pick another one.
4. Only when the page shows a result message (\"Player X wins!\", \"Player O wins!\" or \
\"It's a draw!\") call `game_ended` with the result from your point of view.";

const SYSTEM_MEMORY: &str = "

You also have a `memory` tool backed by files that survive between games. Review it \
before playing and record what you learned once the game is over: strategies that \
worked, mistakes to avoid and habits of this opponent.";

pub const PLAY: &str = "Let's play. The game is already open in the browser. You are X \
and you go first. Take a screenshot to see the board, make your move, then confirm it \
with another screenshot. Wait for my move and keep playing until the page announces a \
result. Do not call game_ended before you see the result message.";

pub const CONTINUE: &str = "Your turn. Take a screenshot, count the pieces on the board \
and click an empty cell.";

pub const MEMORY_REVIEW: &str = "Before we start, review your memory. Use the memory tool \
with command \"view\" and path \"/\" to list what you have stored, then read any files \
about strategy, opponent patterns, past mistakes or game history. If nothing is stored \
yet this is your first game. Tell me when you are ready to play.";

pub const GAME_END: &str = "The game is over. Use the memory tool to save what you learned. \
Keep these files up to date, creating them if they do not exist yet:
- /game_history.md: one entry per game with the outcome and the moves in order.
- /strategy.md: what worked, or what you should have done instead.
- /opponent_patterns.md: moves and tendencies the opponent showed.
- /mistakes.md: errors you made and how to avoid them.
View existing files first and prefer str_replace or insert over rewriting them. Be brief \
and specific.";

pub fn system_prompt(memory_enabled: bool) -> String {
    if memory_enabled {
        format!("{SYSTEM_BASE}{SYSTEM_MEMORY}")
    } else {
        SYSTEM_BASE.to_string()
    }
}
