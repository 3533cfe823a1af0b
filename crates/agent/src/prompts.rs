//! Fixed instruction texts sent to the model.

use crate::extract::{DATA_GENERATOR_LABEL, TEST_FILE_LABEL};

/// The first user turn of every run.
pub fn discovery_prompt(form_url: &str) -> String {
    format!(
        r#"You are a test automation expert. Explore the web form below with the browser tools and write a Playwright test file for it.

Target URL: {form_url}

## Steps

1. Open the form URL with browser_navigate.
2. Take a snapshot to learn the structure of the form.
3. Try each kind of field once (one text input, one radio group, one dropdown, and so on).
4. Fill every required field and submit the form to confirm a successful submission.
5. Write the output files using the best locators you found.

## Locators

Prefer accessible locators, in this order:

1. `page.getByRole('button', {{ name: 'Submit' }})` for buttons, links, checkboxes and radios
2. `page.getByLabel('Email')` for inputs with a visible label
3. `page.getByPlaceholder('Enter email')` for inputs with only a placeholder
4. `page.getByText('Welcome')` for checking text content

Fall back to ids or CSS selectors only when an element has no accessible name.
Use web-first assertions such as `await expect(locator).toBeVisible()`.

## Keep it short

- Discover the locator patterns; do not exercise every field.
- After about 10 interactions, stop exploring and write the output.
- If a click times out, try one alternative, then move on.
- Write at most 3 tests. A successful submission test is mandatory.

## Output format

When you are done, reply with exactly these two blocks:

```{TEST_FILE_LABEL}
// the complete Playwright test file
```

```{DATA_GENERATOR_LABEL}
// a small module exporting valid test data
```

Start now."#
    )
}

/// Inserted once, five iterations before the limit.
pub fn nudge_prompt() -> String {
    format!(
        "You have explored enough. Stop exploring now and reply with the {TEST_FILE_LABEL} and {DATA_GENERATOR_LABEL} blocks."
    )
}
